//! Describe the execution of a composed query.
//!
//! The plan keeps the composed entity select together with every terminal
//! clause the walk produced. Choosing which of those clauses decides the
//! result shape happens at execution time.

use super::ast;
use super::helpers;
use super::string::SQL;

/// How the values of an output column are decoded.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum OutputType {
    /// Whatever the database returns.
    Default,
    /// Stored as 0 or 1.
    Boolean,
    /// Stored as JSON text.
    Json,
}

/// A column in the output of a query.
#[derive(Debug, Clone, PartialEq)]
pub struct OutputColumn {
    pub alias: ast::ColumnAlias,
    pub expression: ast::Expression,
    pub output_type: OutputType,
}

impl OutputColumn {
    fn select_item(&self) -> (ast::ColumnAlias, ast::Expression) {
        (self.alias.clone(), self.expression.clone())
    }
}

/// An aggregate computed over the whole filtered row set.
#[derive(Debug, Clone, PartialEq)]
pub enum ScalarAggregate {
    /// The number of rows.
    Count,
    /// An aggregate function applied to one expression.
    Function {
        function: ast::Function,
        argument: ast::Expression,
    },
}

/// Definition of an execution plan to be run against the database.
#[derive(Debug, Clone, PartialEq)]
pub struct ExecutionPlan {
    pub root_collection: String,
    /// The composed query, selecting every column of the root collection.
    pub select: ast::Select,
    pub entity_columns: Vec<OutputColumn>,
    pub scalar: Option<ScalarAggregate>,
    pub one: bool,
    pub values: Option<OutputColumn>,
    pub columns: Option<Vec<OutputColumn>>,
    pub group_by: Option<Vec<ast::Expression>>,
}

impl ExecutionPlan {
    pub fn limit(&self) -> Option<u32> {
        self.select.limit.limit
    }

    pub fn offset(&self) -> Option<u32> {
        self.select.limit.offset
    }

    /// The composed query returning full entities.
    pub fn entity_select(&self) -> ast::Select {
        self.select.clone()
    }

    /// The composed query reduced to a single aggregate value.
    ///
    /// A row count is taken over the composed query as a subquery so that
    /// joins, limit and offset are respected.
    pub fn scalar_select(&self, aggregate: &ScalarAggregate) -> ast::Select {
        match aggregate {
            ScalarAggregate::Count => helpers::count_star_select(self.entity_select()),
            ScalarAggregate::Function { function, argument } => {
                self.with_only_columns(vec![(
                    helpers::make_column_alias("value".to_string()),
                    ast::Expression::FunctionCall {
                        function: function.clone(),
                        args: vec![argument.clone()],
                    },
                )])
            }
        }
    }

    /// The composed query reduced to one column.
    pub fn values_select(&self, column: &OutputColumn) -> ast::Select {
        self.with_only_columns(vec![column.select_item()])
    }

    /// The composed query reduced to the given columns, grouped if needed.
    pub fn columns_select(
        &self,
        columns: &[OutputColumn],
        group_by: Option<&[ast::Expression]>,
    ) -> ast::Select {
        let mut select =
            self.with_only_columns(columns.iter().map(OutputColumn::select_item).collect());
        if let Some(group_by) = group_by {
            select.group_by = ast::GroupBy {
                elements: group_by.to_vec(),
            };
        }
        select
    }

    /// Count every row matched by the composed query, ignoring its
    /// limit, offset and ordering.
    pub fn total_count_select(&self) -> ast::Select {
        let mut select = self.entity_select();
        select.limit = helpers::empty_limit();
        select.order_by = helpers::empty_order_by();
        helpers::count_star_select(select)
    }

    fn with_only_columns(
        &self,
        select_list: Vec<(ast::ColumnAlias, ast::Expression)>,
    ) -> ast::Select {
        let mut select = self.entity_select();
        select.select_list = ast::SelectList(select_list);
        select
    }

    /// Render the entity query. Useful for logging and explaining.
    pub fn query_sql(&self) -> SQL {
        select_to_sql(&self.select)
    }
}

/// Render a select to a parameterised SQL string.
pub fn select_to_sql(select: &ast::Select) -> SQL {
    let mut sql = SQL::new();
    select.to_sql(&mut sql);
    sql
}
