use std::collections::HashMap;

use similar_asserts::assert_eq;
use sqlx::sqlite::SqlitePool;

use rql_cli::{run, Command, Context, QueryArgs};
use rql_configuration::environment::Variable;

/// A directory with an initialized and updated configuration for the
/// fixture database, which lives in the same directory.
struct Workspace {
    dir: tempfile::TempDir,
    environment: HashMap<Variable, String>,
}

impl Workspace {
    async fn new() -> Workspace {
        tests_common::init_logging();
        let dir = tempfile::tempdir().unwrap();
        let uri = format!("sqlite://{}?mode=rwc", dir.path().join("fixture.db").display());
        let pool = SqlitePool::connect(&uri).await.unwrap();
        tests_common::database::populate(&pool).await.unwrap();
        pool.close().await;

        let workspace = Workspace {
            dir,
            environment: HashMap::from([(Variable::from("RQL_DATABASE_URL"), uri)]),
        };
        workspace.run(Command::Initialize).await.unwrap();
        workspace.run(Command::Update).await.unwrap();
        workspace
    }

    async fn run(&self, command: Command) -> anyhow::Result<String> {
        let context = Context {
            context_path: self.dir.path().to_path_buf(),
            environment: self.environment.clone(),
        };
        let mut output = vec![];
        run(command, context, &mut output).await?;
        Ok(String::from_utf8(output)?)
    }
}

fn args(expression: &str) -> QueryArgs {
    QueryArgs {
        collection: "user".to_string(),
        expression: expression.to_string(),
        limit: None,
    }
}

#[tokio::test]
async fn update_writes_the_introspected_metadata() {
    let workspace = Workspace::new().await;

    let parsed = rql_configuration::parse_configuration(workspace.dir.path())
        .await
        .unwrap();
    assert_eq!(parsed.metadata, tests_common::metadata::metadata());
}

#[tokio::test]
async fn initialize_does_not_overwrite() {
    let workspace = Workspace::new().await;

    let error = workspace.run(Command::Initialize).await.unwrap_err();
    assert!(
        error.to_string().starts_with("a configuration already exists"),
        "{error}"
    );
}

#[tokio::test]
async fn translate_prints_statement_and_parameters() {
    let workspace = Workspace::new().await;

    let output = workspace
        .run(Command::Translate(args("state=FL&values(name)")))
        .await
        .unwrap();
    assert!(output.starts_with("SELECT"), "{output}");
    assert!(output.ends_with("-- ?1 = \"FL\"\n"), "{output}");
}

#[tokio::test]
async fn query_prints_json() {
    let workspace = Workspace::new().await;

    let output = workspace
        .run(Command::Query(args("state=FL&count()")))
        .await
        .unwrap();
    assert_eq!(output, "17\n");

    let output = workspace
        .run(Command::Query(QueryArgs {
            limit: Some(2),
            ..args("values(user_id)")
        }))
        .await
        .unwrap();
    let values: serde_json::Value = serde_json::from_str(&output).unwrap();
    assert_eq!(values, serde_json::json!([0, 1]));
}

#[tokio::test]
async fn paginate_prints_links() {
    let workspace = Workspace::new().await;

    let output = workspace
        .run(Command::Paginate(args("state=TX&limit(5,5)")))
        .await
        .unwrap();
    let page: serde_json::Value = serde_json::from_str(&output).unwrap();
    assert_eq!(page["total"], 17);
    assert_eq!(page["previous_page"], "and(eq(state,TX),limit(5,0))");
    assert_eq!(page["next_page"], "and(eq(state,TX),limit(5,10))");
    assert_eq!(page["page"].as_array().unwrap().len(), 5);
}

#[tokio::test]
async fn explain_prints_the_query_plan() {
    let workspace = Workspace::new().await;

    let output = workspace
        .run(Command::Explain(args("state=FL")))
        .await
        .unwrap();
    assert!(output.starts_with("SELECT"), "{output}");
    assert!(output.contains("SCAN"), "{output}");
}

#[tokio::test]
async fn unknown_collections_are_reported() {
    let workspace = Workspace::new().await;

    let error = workspace
        .run(Command::Query(QueryArgs {
            collection: "comment".to_string(),
            ..args("")
        }))
        .await
        .unwrap_err();
    assert_eq!(error.to_string(), "Collection 'comment' not found.");
}
