use query_engine_sql::sql;
use query_engine_translation::translation;
use rql_configuration::QueryDefaults;

/// Translate an expression over the fixture's `user` collection.
pub fn translate_with(
    defaults: &QueryDefaults,
    expression: &str,
) -> Result<translation::query::ComposedQuery, translation::error::Error> {
    let metadata = tests_common::metadata::metadata();
    let env = translation::helpers::Env::new(&metadata, defaults);
    translation::query::translate(&env, &["user"], expression, None)
}

pub fn translate(
    expression: &str,
) -> Result<translation::query::ComposedQuery, translation::error::Error> {
    translate_with(&QueryDefaults::default(), expression)
}

/// Render a select, dropping the select list: everything from the FROM clause on.
pub fn from_clause_on(select: &sql::ast::Select) -> (String, Vec<String>) {
    let rendered = sql::execution_plan::select_to_sql(select);
    let sql = match rendered.sql.split_once(" FROM ") {
        Some((_, rest)) => format!("FROM {rest}"),
        None => rendered.sql,
    };
    let params = rendered
        .params
        .into_iter()
        .map(|sql::string::Param::String(param)| param)
        .collect();
    (sql, params)
}

/// Translate and render the entity query from its FROM clause on.
pub fn test_translation(expression: &str) -> (String, Vec<String>) {
    let composed = translate(expression).unwrap();
    from_clause_on(&composed.plan.select)
}

/// Render a full select and its parameters.
pub fn render(select: &sql::ast::Select) -> (String, Vec<String>) {
    let rendered = sql::execution_plan::select_to_sql(select);
    let params = rendered
        .params
        .into_iter()
        .map(|sql::string::Param::String(param)| param)
        .collect();
    (rendered.sql, params)
}

pub fn error_message(expression: &str) -> String {
    translate(expression).unwrap_err().to_string()
}
