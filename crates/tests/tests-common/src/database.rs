//! An SQLite database of users, their blogs and the blogs' posts.
//!
//! Every value is derived from the user's index, so tests can compute the
//! rows they expect from [`users`] instead of hard-coding them.

use chrono::{Duration, NaiveDate};
use serde_json::json;
use sqlx::sqlite::{SqlitePool, SqlitePoolOptions};

pub const USER_COUNT: i64 = 1000;

/// The guid of user 0. Later users count up from it.
const GUID_BASE: u128 = 0x658c_407c_6c19_470e_9aa6_8c2b_86cd_0000;

const SCHEMA: &[&str] = &[
    r#"CREATE TABLE "user" (
        user_id INTEGER PRIMARY KEY,
        guid VARCHAR(36) UNIQUE,
        name VARCHAR(200),
        email VARCHAR(120) UNIQUE,
        gender VARCHAR(6),
        birthdate DATE,
        registered DATETIME,
        is_active BOOLEAN,
        city VARCHAR(50),
        state VARCHAR(2),
        balance REAL,
        raw JSON,
        misc JSON
    )"#,
    r#"CREATE TABLE blog (
        id INTEGER PRIMARY KEY,
        title TEXT,
        user_id INTEGER REFERENCES "user" (user_id)
    )"#,
    r"CREATE TABLE post (
        id INTEGER PRIMARY KEY,
        title TEXT,
        blog_id INTEGER REFERENCES blog (id)
    )",
];

const FIRST_NAMES: [&str; 20] = [
    "Mavis", "Jerome", "Alba", "Tomas", "Rhea", "Felix", "Dora", "Hugo", "Ines", "Otto", "Lena",
    "Basil", "Vera", "Cyrus", "Nadia", "Emil", "Greta", "Ivor", "Opal", "Rufus",
];

const LAST_NAMES: [&str; 50] = [
    "Cherry", "Jackson", "Holt", "Marsh", "Quinn", "Pryor", "Vance", "Wolfe", "Ayala", "Baxter",
    "Crane", "Doyle", "Ellison", "Finch", "Garner", "Hale", "Irwin", "Joyner", "Keller", "Lowe",
    "Mercer", "Nolan", "Osborn", "Pike", "Rowe", "Salas", "Tate", "Underwood", "Vaughn", "Walsh",
    "Yates", "Zamora", "Archer", "Bishop", "Carver", "Dalton", "Eaton", "Fowler", "Gentry",
    "Hobbs", "Ingram", "Jarvis", "Kirby", "Lyons", "Madden", "Nash", "Oakley", "Parks", "Ramsey",
    "Sutton",
];

const DOMAINS: [&str; 3] = ["besto.com", "nspire.com", "example.org"];

/// States other than the two that are rare on purpose.
const COMMON_STATES: [&str; 8] = ["CA", "NY", "WA", "OR", "NV", "AZ", "CO", "UT"];

const CITIES: [&str; 10] = [
    "Springfield",
    "Riverside",
    "Fairview",
    "Madison",
    "Georgetown",
    "Salem",
    "Franklin",
    "Clinton",
    "Arlington",
    "Ashland",
];

const TAGS: [&str; 7] = ["aliqua", "dolor", "elit", "magna", "irure", "velit", "culpa"];
const EYE_COLORS: [&str; 3] = ["blue", "brown", "green"];
const FRUITS: [&str; 3] = ["banana", "apple", "strawberry"];

/// A user as stored in the fixture database.
#[derive(Debug, Clone, PartialEq)]
pub struct User {
    pub user_id: i64,
    pub guid: String,
    pub name: String,
    pub email: String,
    pub gender: String,
    pub birthdate: String,
    pub registered: String,
    pub is_active: bool,
    pub city: String,
    pub state: String,
    pub balance: f64,
    pub raw: serde_json::Value,
    pub misc: serde_json::Value,
}

impl User {
    fn generate(index: i64) -> User {
        let position = usize::try_from(index).unwrap_or_default();
        let first_name = FIRST_NAMES[position % FIRST_NAMES.len()];
        let last_name = LAST_NAMES[(position / FIRST_NAMES.len()) % LAST_NAMES.len()];

        let guid = uuid::Uuid::from_u128(GUID_BASE + u128::from(index.unsigned_abs())).to_string();
        let name = format!("{first_name} {last_name}");
        let email = format!("user{index}@{}", DOMAINS[position % DOMAINS.len()]);
        let gender = if index % 2 == 0 { "female" } else { "male" }.to_string();
        let state = match index % 59 {
            0 => "FL",
            29 => "TX",
            _ => COMMON_STATES[position % COMMON_STATES.len()],
        }
        .to_string();
        let is_active = index % 3 != 0;
        let balance = 1000.0 + ((index * 7919) % 3000) as f64 + (index % 100) as f64 / 100.0;

        let birthdate = (epoch(1950) + Duration::days((index * 17) % 18_000))
            .format("%Y-%m-%d")
            .to_string();
        let registered = (epoch(2014).and_hms_opt(0, 0, 0).unwrap_or_default()
            + Duration::seconds(index * 86_413))
        .format("%Y-%m-%d %H:%M:%S")
        .to_string();

        let tags: Vec<&str> = [0, 2, 4]
            .iter()
            .map(|offset| TAGS[(position + offset) % TAGS.len()])
            .collect();

        let raw = json!({
            "index": index,
            "guid": guid,
            "name": name,
            "email": email,
            "gender": gender,
            "state": state,
            "isActive": is_active,
            "balance": balance,
            "birthdate": birthdate,
            "registered": registered,
            "tags": tags,
        });
        let misc = json!({
            "eye_color": EYE_COLORS[position % EYE_COLORS.len()],
            "likes_apples": index % 4 == 0,
            "unread_messages": index % 10,
            "balance": balance,
            "preferences": {
                "favorite_fruit": FRUITS[position % FRUITS.len()],
            },
            "location": {
                "coordinates": [
                    -90.0 + ((index * 13) % 1800) as f64 / 10.0,
                    -180.0 + ((index * 37) % 3600) as f64 / 10.0,
                ],
            },
        });

        User {
            user_id: index,
            guid,
            name,
            email,
            gender,
            birthdate,
            registered,
            is_active,
            city: CITIES[position % CITIES.len()].to_string(),
            state,
            balance,
            raw,
            misc,
        }
    }

    /// The user as an entity row: every column under its own name.
    pub fn to_json(&self) -> serde_json::Value {
        json!({
            "user_id": self.user_id,
            "guid": self.guid,
            "name": self.name,
            "email": self.email,
            "gender": self.gender,
            "birthdate": self.birthdate,
            "registered": self.registered,
            "is_active": self.is_active,
            "city": self.city,
            "state": self.state,
            "balance": self.balance,
            "raw": self.raw,
            "misc": self.misc,
        })
    }
}

fn epoch(year: i32) -> NaiveDate {
    NaiveDate::from_ymd_opt(year, 1, 1).unwrap_or_default()
}

/// Every user of the fixture, in `user_id` order.
pub fn users() -> Vec<User> {
    (0..USER_COUNT).map(User::generate).collect()
}

/// The blogs of the fixture as `(id, title, user_id)`. The first three users
/// have three blogs each.
pub fn blogs() -> Vec<(i64, String, i64)> {
    let users = users();
    (0..3)
        .flat_map(|user_id| (0..3).map(move |blog_no| (user_id, blog_no)))
        .enumerate()
        .map(|(position, (user_id, blog_no))| {
            let name = &users[usize::try_from(user_id).unwrap_or_default()].name;
            (
                i64::try_from(position).unwrap_or_default() + 1,
                format!("Blog {blog_no} for {name}"),
                user_id,
            )
        })
        .collect()
}

/// The posts of the fixture as `(id, title, blog_id)`. Blogs of the first two
/// users have three posts each, those of the third user have none.
pub fn posts() -> Vec<(i64, String, i64)> {
    blogs()
        .into_iter()
        .filter(|(_, _, user_id)| *user_id != 2)
        .flat_map(|(blog_id, title, _)| {
            (0..3).map(move |post_no| (format!("Post {post_no} of blog \"{title}\""), blog_id))
        })
        .enumerate()
        .map(|(position, (title, blog_id))| {
            (i64::try_from(position).unwrap_or_default() + 1, title, blog_id)
        })
        .collect()
}

/// Create the fixture's tables and rows in the database behind the pool.
pub async fn populate(pool: &SqlitePool) -> anyhow::Result<()> {
    let mut transaction = pool.begin().await?;

    for statement in SCHEMA {
        sqlx::query(statement).execute(&mut *transaction).await?;
    }

    for user in users() {
        sqlx::query(
            r#"INSERT INTO "user" (user_id, guid, name, email, gender, birthdate, registered,
                is_active, city, state, balance, raw, misc)
               VALUES (?, ?, ?, ?, ?, ?, ?, ?, ?, ?, ?, ?, ?)"#,
        )
        .bind(user.user_id)
        .bind(&user.guid)
        .bind(&user.name)
        .bind(&user.email)
        .bind(&user.gender)
        .bind(&user.birthdate)
        .bind(&user.registered)
        .bind(user.is_active)
        .bind(&user.city)
        .bind(&user.state)
        .bind(user.balance)
        .bind(user.raw.to_string())
        .bind(user.misc.to_string())
        .execute(&mut *transaction)
        .await?;
    }

    for (id, title, user_id) in blogs() {
        sqlx::query("INSERT INTO blog (id, title, user_id) VALUES (?, ?, ?)")
            .bind(id)
            .bind(title)
            .bind(user_id)
            .execute(&mut *transaction)
            .await?;
    }

    for (id, title, blog_id) in posts() {
        sqlx::query("INSERT INTO post (id, title, blog_id) VALUES (?, ?, ?)")
            .bind(id)
            .bind(title)
            .bind(blog_id)
            .execute(&mut *transaction)
            .await?;
    }

    transaction.commit().await?;
    Ok(())
}

/// A pool over a fresh in-memory database holding the fixture.
///
/// An in-memory database lives as long as its connection, so the pool keeps
/// exactly one connection open for its whole lifetime.
pub async fn fixture_pool() -> anyhow::Result<SqlitePool> {
    let pool = SqlitePoolOptions::new()
        .max_connections(1)
        .idle_timeout(None)
        .max_lifetime(None)
        .connect("sqlite::memory:")
        .await?;
    populate(&pool).await?;
    Ok(pool)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn names_emails_and_balances_are_unique() {
        let users = users();
        let mut names: Vec<&str> = users.iter().map(|u| u.name.as_str()).collect();
        names.sort_unstable();
        names.dedup();
        assert_eq!(names.len(), users.len());

        let mut balances: Vec<f64> = users.iter().map(|u| u.balance).collect();
        balances.sort_by(f64::total_cmp);
        balances.dedup();
        assert_eq!(balances.len(), users.len());
    }

    #[test]
    fn rare_states() {
        let rare = users()
            .iter()
            .filter(|u| u.state == "FL" || u.state == "TX")
            .count();
        assert_eq!(rare, 34);
    }

    #[test]
    fn blogs_and_posts() {
        assert_eq!(blogs().len(), 9);
        assert_eq!(posts().len(), 18);
        assert_eq!(blogs()[4].1, "Blog 1 for Jerome Cherry");
        assert_eq!(posts()[3].1, "Post 0 of blog \"Blog 1 for Mavis Cherry\"");
    }
}
