//! Type definitions of a low-level SQL string representation.

/// A SQL string with its parameters.
#[derive(Debug, PartialEq, Eq)]
pub struct SQL {
    pub sql: String,
    pub params: Vec<Param>,
    /// for internal use and tests only
    pub param_index: u64,
}

impl Default for SQL {
    fn default() -> Self {
        Self::new()
    }
}

/// A parameter for a parameterized query.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Param {
    /// A literal string
    String(String),
}

impl SQL {
    pub fn new() -> SQL {
        SQL {
            sql: String::new(),
            params: vec![],
            param_index: 0,
        }
    }
    pub fn append_syntax(&mut self, sql: &str) {
        self.sql.push_str(sql);
    }
    /// Append a double-quoted identifier.
    pub fn append_identifier(&mut self, sql: &str) {
        self.sql.push('"');
        self.sql.push_str(&sql.replace('"', "\"\""));
        self.sql.push('"');
    }
    /// Append a single-quoted string literal.
    pub fn append_string_literal(&mut self, sql: &str) {
        self.sql.push('\'');
        self.sql.push_str(&sql.replace('\'', "''"));
        self.sql.push('\'');
    }
    /// Append a numbered placeholder and record its parameter.
    pub fn append_param(&mut self, param: Param) {
        self.param_index += 1;
        self.sql.push_str(format!("?{}", self.param_index).as_str());
        self.params.push(param);
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn identifiers_and_literals_are_escaped() {
        let mut sql = SQL::new();
        sql.append_identifier("we\"ird");
        sql.append_syntax(" = ");
        sql.append_string_literal("it's");
        assert_eq!(sql.sql, "\"we\"\"ird\" = 'it''s'");
    }

    #[test]
    fn params_are_numbered() {
        let mut sql = SQL::new();
        sql.append_param(Param::String("a".to_string()));
        sql.append_syntax(", ");
        sql.append_param(Param::String("b".to_string()));
        assert_eq!(sql.sql, "?1, ?2");
        assert_eq!(
            sql.params,
            vec![Param::String("a".to_string()), Param::String("b".to_string())]
        );
    }
}
