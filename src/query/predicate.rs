//! Conjunctive WHERE-clause builder with positional binds

use chrono::NaiveDate;
use sqlx::postgres::PgArguments;
use sqlx::query::{QueryAs, QueryScalar};
use sqlx::Postgres;

/// A value bound to one `$n` placeholder
#[derive(Debug, Clone, PartialEq)]
pub enum BindValue {
    Text(String),
    Float(f64),
    Date(NaiveDate),
}

impl From<f64> for BindValue {
    fn from(value: f64) -> Self {
        BindValue::Float(value)
    }
}

impl From<NaiveDate> for BindValue {
    fn from(value: NaiveDate) -> Self {
        BindValue::Date(value)
    }
}

impl From<String> for BindValue {
    fn from(value: String) -> Self {
        BindValue::Text(value)
    }
}

/// Ordered clauses joined with AND, plus the values they bind.
///
/// A placeholder number is allocated at the moment its value is pushed, so
/// the bind list always has the same arity and order as the SQL text.
/// Filters that are `None` (or blank text) add nothing.
#[derive(Debug, Default, Clone)]
pub struct Predicate {
    clauses: Vec<String>,
    binds: Vec<BindValue>,
}

impl Predicate {
    pub fn new() -> Self {
        Self::default()
    }

    fn placeholder(&mut self, value: BindValue) -> String {
        self.binds.push(value);
        format!("${}", self.binds.len())
    }

    /// `column = $n`
    pub fn equals(mut self, column: &str, value: Option<&str>) -> Self {
        if let Some(value) = non_blank(value) {
            let p = self.placeholder(value.to_string().into());
            self.clauses.push(format!("{column} = {p}"));
        }
        self
    }

    /// `column >= $n`
    pub fn at_least<T: Into<BindValue>>(mut self, column: &str, value: Option<T>) -> Self {
        if let Some(value) = value {
            let p = self.placeholder(value.into());
            self.clauses.push(format!("{column} >= {p}"));
        }
        self
    }

    /// `column <= $n`
    pub fn at_most<T: Into<BindValue>>(mut self, column: &str, value: Option<T>) -> Self {
        if let Some(value) = value {
            let p = self.placeholder(value.into());
            self.clauses.push(format!("{column} <= {p}"));
        }
        self
    }

    /// Case-insensitive substring match against any of `columns`.
    /// The `%term%` pattern is bound once per column.
    pub fn contains_any(mut self, columns: &[&str], term: Option<&str>) -> Self {
        let Some(term) = non_blank(term) else {
            return self;
        };
        if columns.is_empty() {
            return self;
        }

        let pattern = format!("%{term}%");
        let alternatives: Vec<String> = columns
            .iter()
            .map(|column| {
                let p = self.placeholder(pattern.clone().into());
                format!("{column} ILIKE {p}")
            })
            .collect();
        self.clauses.push(format!("({})", alternatives.join(" OR ")));
        self
    }

    /// `WHERE a AND b ...`, or an empty string when no filter applied
    pub fn where_clause(&self) -> String {
        if self.clauses.is_empty() {
            String::new()
        } else {
            format!("WHERE {}", self.clauses.join(" AND "))
        }
    }

    /// Index of the first placeholder free for trailing binds (LIMIT/OFFSET)
    pub fn next_placeholder(&self) -> usize {
        self.binds.len() + 1
    }

    pub fn binds(&self) -> &[BindValue] {
        &self.binds
    }

    pub fn is_empty(&self) -> bool {
        self.clauses.is_empty()
    }

    /// Bind every value, in order, onto a row query
    pub fn bind_as<'q, O>(
        &'q self,
        mut q: QueryAs<'q, Postgres, O, PgArguments>,
    ) -> QueryAs<'q, Postgres, O, PgArguments> {
        for value in &self.binds {
            q = match value {
                BindValue::Text(v) => q.bind(v.as_str()),
                BindValue::Float(v) => q.bind(*v),
                BindValue::Date(v) => q.bind(*v),
            };
        }
        q
    }

    /// Bind every value, in order, onto a scalar query
    pub fn bind_scalar<'q, O>(
        &'q self,
        mut q: QueryScalar<'q, Postgres, O, PgArguments>,
    ) -> QueryScalar<'q, Postgres, O, PgArguments> {
        for value in &self.binds {
            q = match value {
                BindValue::Text(v) => q.bind(v.as_str()),
                BindValue::Float(v) => q.bind(*v),
                BindValue::Date(v) => q.bind(*v),
            };
        }
        q
    }
}

fn non_blank(value: Option<&str>) -> Option<&str> {
    value.map(str::trim).filter(|v| !v.is_empty())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_no_filters_no_where() {
        let predicate = Predicate::new()
            .equals("r.province", None)
            .at_least::<f64>("t.ph_value", None);

        assert!(predicate.is_empty());
        assert_eq!(predicate.where_clause(), "");
        assert_eq!(predicate.next_placeholder(), 1);
    }

    #[test]
    fn test_placeholders_follow_push_order() {
        let predicate = Predicate::new()
            .equals("r.province", Some("四川省"))
            .at_least("t.ph_value", Some(5.5))
            .at_most("t.ph_value", Some(7.5));

        assert_eq!(
            predicate.where_clause(),
            "WHERE r.province = $1 AND t.ph_value >= $2 AND t.ph_value <= $3"
        );
        assert_eq!(
            predicate.binds(),
            &[
                BindValue::Text("四川省".to_string()),
                BindValue::Float(5.5),
                BindValue::Float(7.5),
            ]
        );
        assert_eq!(predicate.next_placeholder(), 4);
    }

    #[test]
    fn test_location_binds_pattern_per_column() {
        let predicate = Predicate::new()
            .contains_any(&["r.province", "r.city", "r.county"], Some("成都"))
            .at_most("t.ph_value", Some(8.0));

        assert_eq!(
            predicate.where_clause(),
            "WHERE (r.province ILIKE $1 OR r.city ILIKE $2 OR r.county ILIKE $3) AND t.ph_value <= $4"
        );
        let pattern = BindValue::Text("%成都%".to_string());
        assert_eq!(&predicate.binds()[..3], &[pattern.clone(), pattern.clone(), pattern]);
        assert_eq!(predicate.binds().len(), 4);
    }

    #[test]
    fn test_appending_keeps_earlier_binds() {
        let base = Predicate::new().at_least("t.ph_value", Some(6.0));
        let before = base.binds().to_vec();

        let extended = base.at_most("s.sampling_date", NaiveDate::from_ymd_opt(2024, 6, 30));

        assert_eq!(&extended.binds()[..1], before.as_slice());
        assert_eq!(
            extended.binds()[1],
            BindValue::Date(NaiveDate::from_ymd_opt(2024, 6, 30).unwrap())
        );
    }

    #[test]
    fn test_blank_text_is_ignored() {
        let predicate = Predicate::new()
            .equals("r.province", Some("   "))
            .contains_any(&["r.city"], Some(""));

        assert!(predicate.is_empty());
        assert!(predicate.binds().is_empty());
    }

    #[test]
    fn test_text_is_trimmed() {
        let predicate = Predicate::new().equals("r.province", Some(" 河北省 "));
        assert_eq!(predicate.binds(), &[BindValue::Text("河北省".to_string())]);
    }

    #[test]
    fn test_values_never_inlined() {
        let predicate = Predicate::new().equals("r.province", Some("x' OR '1'='1"));
        assert_eq!(predicate.where_clause(), "WHERE r.province = $1");
    }
}
