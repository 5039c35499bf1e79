//! Convert a SQL AST to a low-level SQL string.

use super::ast::*;
use super::helpers;
use super::string::{Param, SQL};

// Convert to SQL strings

impl Select {
    pub fn to_sql(&self, sql: &mut SQL) {
        sql.append_syntax("SELECT ");
        if self.distinct {
            sql.append_syntax("DISTINCT ");
        }

        self.select_list.to_sql(sql);

        if let Some(from) = &self.from {
            sql.append_syntax(" ");
            from.to_sql(sql);
        }

        for join in &self.joins {
            join.to_sql(sql);
        }

        self.where_.to_sql(sql);
        self.group_by.to_sql(sql);
        self.order_by.to_sql(sql);
        self.limit.to_sql(sql);
    }
}

impl SelectList {
    pub fn to_sql(&self, sql: &mut SQL) {
        let SelectList(select_list) = self;
        for (index, (col, expr)) in select_list.iter().enumerate() {
            if index > 0 {
                sql.append_syntax(", ");
            }
            expr.to_sql(sql);
            sql.append_syntax(" AS ");
            col.to_sql(sql);
        }
    }
}

impl From {
    pub fn to_sql(&self, sql: &mut SQL) {
        sql.append_syntax("FROM ");
        match &self {
            From::Table { reference, alias } => {
                reference.to_sql(sql);
                sql.append_syntax(" AS ");
                alias.to_sql(sql);
            }
            From::Select { select, alias } => {
                sql.append_syntax("(");
                select.to_sql(sql);
                sql.append_syntax(")");
                sql.append_syntax(" AS ");
                alias.to_sql(sql);
            }
        }
    }
}

impl Join {
    pub fn to_sql(&self, sql: &mut SQL) {
        match self {
            Join::LeftOuterJoin(LeftOuterJoin { table, alias, on }) => {
                sql.append_syntax(" LEFT OUTER JOIN ");
                table.to_sql(sql);
                sql.append_syntax(" AS ");
                alias.to_sql(sql);
                sql.append_syntax(" ON ");
                on.to_sql(sql);
            }
        }
    }
}

impl Where {
    pub fn to_sql(&self, sql: &mut SQL) {
        let Where(expression) = self;
        if *expression != helpers::true_expr() {
            sql.append_syntax(" WHERE ");
            expression.to_sql(sql);
        }
    }
}

impl GroupBy {
    pub fn to_sql(&self, sql: &mut SQL) {
        if !self.elements.is_empty() {
            sql.append_syntax(" GROUP BY ");
            for (index, element) in self.elements.iter().enumerate() {
                if index > 0 {
                    sql.append_syntax(", ");
                }
                element.to_sql(sql);
            }
        }
    }
}

impl OrderBy {
    pub fn to_sql(&self, sql: &mut SQL) {
        if !self.elements.is_empty() {
            sql.append_syntax(" ORDER BY ");
            for (index, element) in self.elements.iter().enumerate() {
                if index > 0 {
                    sql.append_syntax(", ");
                }
                element.to_sql(sql);
            }
        }
    }
}

impl OrderByElement {
    pub fn to_sql(&self, sql: &mut SQL) {
        self.target.to_sql(sql);
        self.direction.to_sql(sql);
    }
}

impl OrderByDirection {
    pub fn to_sql(&self, sql: &mut SQL) {
        match self {
            OrderByDirection::Asc => sql.append_syntax(" ASC"),
            OrderByDirection::Desc => sql.append_syntax(" DESC"),
        }
    }
}

impl Limit {
    pub fn to_sql(&self, sql: &mut SQL) {
        match (self.limit, self.offset) {
            (None, None) => (),
            (limit, offset) => {
                sql.append_syntax(" LIMIT ");
                // SQLite only accepts OFFSET after a LIMIT, -1 means unbounded
                match limit {
                    Some(limit) => sql.append_syntax(limit.to_string().as_str()),
                    None => sql.append_syntax("-1"),
                }
                if let Some(offset) = offset {
                    sql.append_syntax(" OFFSET ");
                    sql.append_syntax(offset.to_string().as_str());
                }
            }
        }
    }
}

// scalars
impl Expression {
    pub fn to_sql(&self, sql: &mut SQL) {
        match &self {
            Expression::ColumnReference(column_reference) => column_reference.to_sql(sql),
            Expression::Value(value) => value.to_sql(sql),
            Expression::And { left, right } => {
                sql.append_syntax("(");
                left.to_sql(sql);
                sql.append_syntax(" AND ");
                right.to_sql(sql);
                sql.append_syntax(")");
            }
            Expression::Or { left, right } => {
                sql.append_syntax("(");
                left.to_sql(sql);
                sql.append_syntax(" OR ");
                right.to_sql(sql);
                sql.append_syntax(")");
            }
            Expression::Not(expr) => {
                sql.append_syntax("NOT ");
                expr.to_sql(sql);
            }
            Expression::BinaryOperation {
                left,
                operator,
                right,
            } => {
                sql.append_syntax("(");
                left.to_sql(sql);
                operator.to_sql(sql);
                right.to_sql(sql);
                sql.append_syntax(")");
            }
            Expression::BinaryArrayOperation {
                left,
                operator,
                right,
            } => {
                sql.append_syntax("(");
                left.to_sql(sql);
                operator.to_sql(sql);
                sql.append_syntax("(");
                for (index, item) in right.iter().enumerate() {
                    if index > 0 {
                        sql.append_syntax(", ");
                    }
                    item.to_sql(sql);
                }
                sql.append_syntax(")");
                sql.append_syntax(")");
            }
            Expression::UnaryOperation {
                expression,
                operator,
            } => {
                sql.append_syntax("(");
                expression.to_sql(sql);
                operator.to_sql(sql);
                sql.append_syntax(")");
            }
            Expression::FunctionCall { function, args } => {
                function.to_sql(sql);
                sql.append_syntax("(");
                for (index, arg) in args.iter().enumerate() {
                    if index > 0 {
                        sql.append_syntax(", ");
                    }
                    arg.to_sql(sql);
                }
                sql.append_syntax(")");
            }
            Expression::JsonPath {
                expression,
                path,
                extract,
            } => {
                sql.append_syntax("(");
                expression.to_sql(sql);
                extract.to_sql(sql);
                path.to_sql(sql);
                sql.append_syntax(")");
            }
            Expression::Cast { expression, r#type } => {
                sql.append_syntax("CAST(");
                expression.to_sql(sql);
                sql.append_syntax(" AS ");
                r#type.to_sql(sql);
                sql.append_syntax(")");
            }
            Expression::Count(count_type) => count_type.to_sql(sql),
        }
    }
}

impl UnaryOperator {
    pub fn to_sql(&self, sql: &mut SQL) {
        match self {
            UnaryOperator::IsNull => sql.append_syntax(" IS NULL"),
            UnaryOperator::IsNotNull => sql.append_syntax(" IS NOT NULL"),
        }
    }
}

impl BinaryOperator {
    pub fn to_sql(&self, sql: &mut SQL) {
        match self {
            BinaryOperator::Equals => sql.append_syntax(" = "),
            BinaryOperator::NotEquals => sql.append_syntax(" != "),
            BinaryOperator::GreaterThan => sql.append_syntax(" > "),
            BinaryOperator::GreaterThanOrEqualTo => sql.append_syntax(" >= "),
            BinaryOperator::LessThan => sql.append_syntax(" < "),
            BinaryOperator::LessThanOrEqualTo => sql.append_syntax(" <= "),
            BinaryOperator::Like => sql.append_syntax(" LIKE "),
            BinaryOperator::NotLike => sql.append_syntax(" NOT LIKE "),
        }
    }
}

impl BinaryArrayOperator {
    pub fn to_sql(&self, sql: &mut SQL) {
        match self {
            BinaryArrayOperator::In => sql.append_syntax(" IN "),
        }
    }
}

impl Function {
    pub fn to_sql(&self, sql: &mut SQL) {
        match self {
            Function::Sum => sql.append_syntax("sum"),
            Function::Avg => sql.append_syntax("avg"),
            Function::Max => sql.append_syntax("max"),
            Function::Min => sql.append_syntax("min"),
            Function::Count => sql.append_syntax("count"),
        }
    }
}

impl CountType {
    pub fn to_sql(&self, sql: &mut SQL) {
        match self {
            CountType::Star => sql.append_syntax("count(*)"),
        }
    }
}

impl JsonExtract {
    pub fn to_sql(&self, sql: &mut SQL) {
        match self {
            JsonExtract::SqlValue => sql.append_syntax(" ->> "),
            JsonExtract::Json => sql.append_syntax(" -> "),
        }
    }
}

impl JsonPath {
    pub fn to_sql(&self, sql: &mut SQL) {
        let mut path = String::from("$");
        for element in &self.elements {
            match element {
                JsonPathElement::Key(key) => {
                    path.push_str(".\"");
                    path.push_str(key);
                    path.push('"');
                }
                // Negative indexes count back from the end of the array.
                JsonPathElement::Index(index) if *index < 0 => {
                    path.push_str("[#");
                    path.push_str(index.to_string().as_str());
                    path.push(']');
                }
                JsonPathElement::Index(index) => {
                    path.push('[');
                    path.push_str(index.to_string().as_str());
                    path.push(']');
                }
            }
        }
        sql.append_string_literal(&path);
    }
}

impl Value {
    pub fn to_sql(&self, sql: &mut SQL) {
        match &self {
            Value::Null => sql.append_syntax("NULL"),
            Value::Bool(true) => sql.append_syntax("true"),
            Value::Bool(false) => sql.append_syntax("false"),
            Value::Int8(i) => sql.append_syntax(i.to_string().as_str()),
            Value::Float8(n) => sql.append_syntax(format!("{n:?}").as_str()),
            Value::Numeric(n) => sql.append_syntax(n),
            Value::String(s) => sql.append_param(Param::String(s.clone())),
        }
    }
}

impl ScalarTypeName {
    pub fn to_sql(&self, sql: &mut SQL) {
        let ScalarTypeName(name) = self;
        sql.append_syntax(name);
    }
}

// names
impl TableReference {
    pub fn to_sql(&self, sql: &mut SQL) {
        match self {
            TableReference::DBTable { table } => table.to_sql(sql),
            TableReference::AliasedTable(alias) => alias.to_sql(sql),
        }
    }
}

impl TableName {
    pub fn to_sql(&self, sql: &mut SQL) {
        let TableName(name) = self;
        sql.append_identifier(name);
    }
}

impl TableAlias {
    pub fn to_sql(&self, sql: &mut SQL) {
        sql.append_identifier(&self.name);
    }
}

impl ColumnReference {
    pub fn to_sql(&self, sql: &mut SQL) {
        match self {
            ColumnReference::TableColumn { table, name } => {
                table.to_sql(sql);
                sql.append_syntax(".");
                name.to_sql(sql);
            }
        }
    }
}

impl ColumnName {
    pub fn to_sql(&self, sql: &mut SQL) {
        let ColumnName(name) = self;
        sql.append_identifier(name);
    }
}

impl ColumnAlias {
    pub fn to_sql(&self, sql: &mut SQL) {
        sql.append_identifier(&self.name);
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::sql::helpers::*;
    use similar_asserts::assert_eq;

    fn column(table: &str, name: &str) -> Expression {
        Expression::ColumnReference(ColumnReference::TableColumn {
            table: TableReference::AliasedTable(make_table_alias(table.to_string())),
            name: ColumnName(name.to_string()),
        })
    }

    fn user_select() -> Select {
        let mut select = simple_select(vec![
            (make_column_alias("user_id".to_string()), column("user", "user_id")),
            (make_column_alias("name".to_string()), column("user", "name")),
        ]);
        select.from = Some(From::Table {
            reference: TableReference::DBTable {
                table: TableName("user".to_string()),
            },
            alias: make_table_alias("user".to_string()),
        });
        select
    }

    #[test]
    fn select_with_every_clause() {
        let mut select = user_select();
        select.distinct = true;
        select.joins = vec![Join::LeftOuterJoin(LeftOuterJoin {
            table: TableReference::DBTable {
                table: TableName("blog".to_string()),
            },
            alias: make_table_alias("user.blogs".to_string()),
            on: Expression::BinaryOperation {
                left: Box::new(column("user", "user_id")),
                operator: BinaryOperator::Equals,
                right: Box::new(column("user.blogs", "user_id")),
            },
        })];
        select.where_ = Where(
            conjunction([
                Expression::BinaryOperation {
                    left: Box::new(column("user", "state")),
                    operator: BinaryOperator::Equals,
                    right: Box::new(Expression::Value(Value::String("FL".to_string()))),
                },
                Expression::BinaryOperation {
                    left: Box::new(column("user", "balance")),
                    operator: BinaryOperator::GreaterThan,
                    right: Box::new(Expression::Value(Value::Float8(1000.0))),
                },
            ])
            .unwrap(),
        );
        select.order_by = OrderBy {
            elements: vec![
                OrderByElement {
                    target: column("user", "name"),
                    direction: OrderByDirection::Asc,
                },
                OrderByElement {
                    target: column("user.blogs", "title"),
                    direction: OrderByDirection::Desc,
                },
            ],
        };
        select.limit = Limit {
            limit: Some(10),
            offset: Some(20),
        };

        let mut sql = SQL::new();
        select.to_sql(&mut sql);
        assert_eq!(
            sql.sql,
            "SELECT DISTINCT \"user\".\"user_id\" AS \"user_id\", \"user\".\"name\" AS \"name\" \
             FROM \"user\" AS \"user\" \
             LEFT OUTER JOIN \"blog\" AS \"user.blogs\" ON (\"user\".\"user_id\" = \"user.blogs\".\"user_id\") \
             WHERE ((\"user\".\"state\" = ?1) AND (\"user\".\"balance\" > 1000.0)) \
             ORDER BY \"user\".\"name\" ASC, \"user.blogs\".\"title\" DESC \
             LIMIT 10 OFFSET 20"
        );
        assert_eq!(sql.params, vec![Param::String("FL".to_string())]);
    }

    #[test]
    fn offset_without_limit() {
        let mut select = user_select();
        select.limit = Limit {
            limit: None,
            offset: Some(5),
        };
        let mut sql = SQL::new();
        select.to_sql(&mut sql);
        assert!(sql.sql.ends_with(" LIMIT -1 OFFSET 5"), "{}", sql.sql);
    }

    #[test]
    fn json_paths_and_casts() {
        let path = Expression::JsonPath {
            expression: Box::new(column("user", "misc")),
            path: JsonPath {
                elements: vec![
                    JsonPathElement::Key("location".to_string()),
                    JsonPathElement::Key("coordinates".to_string()),
                    JsonPathElement::Index(1),
                ],
            },
            extract: JsonExtract::SqlValue,
        };
        let expression = Expression::BinaryOperation {
            left: Box::new(Expression::Cast {
                expression: Box::new(path),
                r#type: ScalarTypeName("REAL".to_string()),
            }),
            operator: BinaryOperator::LessThan,
            right: Box::new(Expression::Value(Value::Float8(-18.4))),
        };
        let mut sql = SQL::new();
        expression.to_sql(&mut sql);
        assert_eq!(
            sql.sql,
            "(CAST((\"user\".\"misc\" ->> '$.\"location\".\"coordinates\"[1]') AS REAL) < -18.4)"
        );
    }

    #[test]
    fn negative_indexes_count_from_the_end() {
        let path = Expression::JsonPath {
            expression: Box::new(column("user", "misc")),
            path: JsonPath {
                elements: vec![
                    JsonPathElement::Key("coordinates".to_string()),
                    JsonPathElement::Index(-1),
                ],
            },
            extract: JsonExtract::SqlValue,
        };
        let mut sql = SQL::new();
        path.to_sql(&mut sql);
        assert_eq!(
            sql.sql,
            "(\"user\".\"misc\" ->> '$.\"coordinates\"[#-1]')"
        );
    }

    #[test]
    fn count_over_subquery() {
        let mut inner = user_select();
        inner.limit.limit = Some(10);
        let mut sql = SQL::new();
        count_star_select(inner).to_sql(&mut sql);
        assert_eq!(
            sql.sql,
            "SELECT count(*) AS \"count\" FROM (SELECT \"user\".\"user_id\" AS \"user_id\", \
             \"user\".\"name\" AS \"name\" FROM \"user\" AS \"user\" LIMIT 10) AS \"anon\""
        );
    }

    #[test]
    fn negated_membership_and_null_checks() {
        let expression = conjunction([
            Expression::Not(Box::new(Expression::BinaryArrayOperation {
                left: Box::new(column("user", "state")),
                operator: BinaryArrayOperator::In,
                right: vec![
                    Expression::Value(Value::String("FL".to_string())),
                    Expression::Value(Value::String("TX".to_string())),
                ],
            })),
            Expression::UnaryOperation {
                expression: Box::new(column("user", "city")),
                operator: UnaryOperator::IsNotNull,
            },
        ])
        .unwrap();
        let mut sql = SQL::new();
        expression.to_sql(&mut sql);
        assert_eq!(
            sql.sql,
            "(NOT (\"user\".\"state\" IN (?1, ?2)) AND (\"user\".\"city\" IS NOT NULL))"
        );
    }
}
