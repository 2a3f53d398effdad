//! Table-bound models with `find_all` / `find_and_count_all`.

use crate::coerce::Row;
use crate::error::Result;
use crate::executor::QueryExecutor;
use crate::query::assembler::{build_count_sql, build_select_sql, COUNT_COLUMN};
use crate::query::QueryDescriptor;
use indexmap::IndexMap;
use serde::Serialize;
use serde_json::Value;

/// A page of rows plus the total matching the filter
#[derive(Debug, Clone, PartialEq, Default, Serialize)]
pub struct FindAndCountAll {
    pub data: Vec<Row>,
    pub total: u64,
}

/// Query surface for one table
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ImpalaModel {
    model_name: String,
    table_name: String,
}

impl ImpalaModel {
    pub fn new(model_name: impl Into<String>, table_name: impl Into<String>) -> Self {
        Self {
            model_name: model_name.into(),
            table_name: table_name.into(),
        }
    }

    pub fn model_name(&self) -> &str {
        &self.model_name
    }

    pub fn table_name(&self) -> &str {
        &self.table_name
    }

    /// SQL that [`find_all`](Self::find_all) would run
    pub fn find_all_sql(&self, descriptor: &QueryDescriptor) -> String {
        build_select_sql(&self.table_name, descriptor)
    }

    /// Count statement used by [`find_and_count_all`](Self::find_and_count_all)
    pub fn count_sql(&self, descriptor: &QueryDescriptor) -> String {
        build_count_sql(&self.table_name, descriptor)
    }

    pub fn find_all<E>(&self, executor: &E, descriptor: &QueryDescriptor) -> Result<Vec<Row>>
    where
        E: QueryExecutor + ?Sized,
    {
        executor.query(&self.find_all_sql(descriptor), None)
    }

    /// Count first, then fetch the page.
    ///
    /// With a group clause the total is the number of groups. When the total
    /// is zero the detail statement is not sent.
    pub fn find_and_count_all<E>(
        &self,
        executor: &E,
        descriptor: &QueryDescriptor,
    ) -> Result<FindAndCountAll>
    where
        E: QueryExecutor + ?Sized,
    {
        let counted = executor.query(&self.count_sql(descriptor), None)?;
        let total = if descriptor.group.iter().all(String::is_empty) {
            counted
                .first()
                .and_then(|row| row.get(COUNT_COLUMN))
                .map_or(0, count_value)
        } else {
            counted.len() as u64
        };

        if total == 0 {
            return Ok(FindAndCountAll::default());
        }

        let data = executor.query(&self.find_all_sql(descriptor), None)?;
        Ok(FindAndCountAll { data, total })
    }
}

/// Read a count cell. Non-numeric or negative values count as zero.
fn count_value(value: &Value) -> u64 {
    match value {
        Value::Number(n) => n
            .as_u64()
            .or_else(|| n.as_f64().filter(|f| *f > 0.0).map(|f| f as u64))
            .unwrap_or(0),
        Value::String(s) => s.trim().parse().unwrap_or(0),
        _ => 0,
    }
}

/// Models by name.
///
/// Registering a name twice replaces the earlier model.
#[derive(Debug, Clone, Default)]
pub struct ModelRegistry {
    models: IndexMap<String, ImpalaModel>,
}

impl ModelRegistry {
    pub fn new() -> Self {
        Self::default()
    }

    /// Add a model, returning the one it replaced
    pub fn register(&mut self, model: ImpalaModel) -> Option<ImpalaModel> {
        let replaced = self.models.insert(model.model_name.clone(), model);
        if let Some(old) = &replaced {
            log::debug!("Model '{}' replaced (was table {})", old.model_name, old.table_name);
        }
        replaced
    }

    pub fn get(&self, model_name: &str) -> Option<&ImpalaModel> {
        self.models.get(model_name)
    }

    pub fn len(&self) -> usize {
        self.models.len()
    }

    pub fn is_empty(&self) -> bool {
        self.models.is_empty()
    }

    pub fn iter(&self) -> impl Iterator<Item = &ImpalaModel> {
        self.models.values()
    }
}

impl FromIterator<ImpalaModel> for ModelRegistry {
    fn from_iter<I: IntoIterator<Item = ImpalaModel>>(iter: I) -> Self {
        let mut registry = Self::new();
        for model in iter {
            registry.register(model);
        }
        registry
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::connection::QueryOptions;
    use serde_json::json;
    use std::sync::Mutex;

    /// Answers the count statement with `count_rows` and anything else with `detail_rows`
    struct FakeExecutor {
        count_rows: Vec<Row>,
        detail_rows: Vec<Row>,
        statements: Mutex<Vec<String>>,
    }

    impl FakeExecutor {
        fn new(count_rows: Value, detail_rows: Value) -> Self {
            Self {
                count_rows: rows(count_rows),
                detail_rows: rows(detail_rows),
                statements: Mutex::new(Vec::new()),
            }
        }

        fn statements(&self) -> Vec<String> {
            self.statements.lock().unwrap().clone()
        }
    }

    fn rows(value: Value) -> Vec<Row> {
        serde_json::from_value(value).unwrap()
    }

    impl QueryExecutor for FakeExecutor {
        fn query(&self, sql: &str, _options: Option<&QueryOptions>) -> Result<Vec<Row>> {
            self.statements.lock().unwrap().push(sql.to_string());
            if sql.starts_with("select count(1)") {
                Ok(self.count_rows.clone())
            } else {
                Ok(self.detail_rows.clone())
            }
        }
    }

    fn sales() -> ImpalaModel {
        ImpalaModel::new("Sales", "dw.sales")
    }

    #[test]
    fn test_find_all_runs_assembled_sql() {
        let exec = FakeExecutor::new(json!([]), json!([{"id": 1}]));
        let descriptor = QueryDescriptor::new().attribute("id").filter("shop", 3).limit(1);
        let found = sales().find_all(&exec, &descriptor).unwrap();

        assert_eq!(found, rows(json!([{"id": 1}])));
        assert_eq!(
            exec.statements(),
            vec!["select id as id\nfrom dw.sales\nwhere shop = 3\nlimit 1"]
        );
    }

    #[test]
    fn test_zero_count_skips_detail_query() {
        let exec = FakeExecutor::new(json!([{"count": 0}]), json!([{"id": 1}]));
        let descriptor = QueryDescriptor::new().attribute("id").filter("shop", 999);
        let result = sales().find_and_count_all(&exec, &descriptor).unwrap();

        assert_eq!(result, FindAndCountAll { data: vec![], total: 0 });
        assert_eq!(exec.statements().len(), 1);
    }

    #[test]
    fn test_missing_count_row_is_zero() {
        let exec = FakeExecutor::new(json!([]), json!([{"id": 1}]));
        let result = sales()
            .find_and_count_all(&exec, &QueryDescriptor::new().attribute("id"))
            .unwrap();
        assert_eq!(result.total, 0);
        assert_eq!(exec.statements().len(), 1);
    }

    #[test]
    fn test_scalar_count_total() {
        let exec = FakeExecutor::new(json!([{"count": 42}]), json!([{"id": 1}, {"id": 2}]));
        let descriptor = QueryDescriptor::new().attribute("id").order_by("id").limit(2);
        let result = sales().find_and_count_all(&exec, &descriptor).unwrap();

        assert_eq!(result.total, 42);
        assert_eq!(result.data.len(), 2);
        assert_eq!(
            exec.statements(),
            vec![
                "select count(1) as count\nfrom dw.sales",
                "select id as id\nfrom dw.sales\norder by id\nlimit 2",
            ]
        );
    }

    #[test]
    fn test_grouped_total_counts_groups_not_sum() {
        let exec = FakeExecutor::new(
            json!([{"count": 10}, {"count": 20}, {"count": 30}]),
            json!([{"shop": "a"}]),
        );
        let descriptor = QueryDescriptor::new().attribute("shop").group_by("shop");
        let result = sales().find_and_count_all(&exec, &descriptor).unwrap();

        assert_eq!(result.total, 3);
        assert_eq!(exec.statements()[0], "select count(1) as count\nfrom dw.sales\ngroup by shop");
    }

    #[test]
    fn test_empty_group_string_keeps_scalar_total() {
        let exec = FakeExecutor::new(json!([{"count": 10}, {"count": 20}]), json!([{"a": 1}]));
        let descriptor =
            QueryDescriptor::from_json(json!({"attributes": ["a"], "group": ""})).unwrap();
        let result = sales().find_and_count_all(&exec, &descriptor).unwrap();

        assert_eq!(result.total, 10);
        assert_eq!(exec.statements()[0], "select count(1) as count\nfrom dw.sales");
    }

    #[test]
    fn test_count_value_variants() {
        assert_eq!(count_value(&json!(7)), 7);
        assert_eq!(count_value(&json!("7")), 7);
        assert_eq!(count_value(&json!(-1)), 0);
        assert_eq!(count_value(&json!(null)), 0);
    }

    #[test]
    fn test_registry_overwrites_duplicates() {
        let mut registry = ModelRegistry::new();
        assert!(registry.register(ImpalaModel::new("Sales", "dw.sales_v1")).is_none());
        let replaced = registry.register(ImpalaModel::new("Sales", "dw.sales_v2"));

        assert_eq!(replaced.unwrap().table_name(), "dw.sales_v1");
        assert_eq!(registry.len(), 1);
        assert_eq!(registry.get("Sales").unwrap().table_name(), "dw.sales_v2");
    }

    #[test]
    fn test_registry_from_iter() {
        let registry: ModelRegistry = vec![
            ImpalaModel::new("Sales", "dw.sales"),
            ImpalaModel::new("Shops", "dw.shops"),
        ]
        .into_iter()
        .collect();
        let names: Vec<_> = registry.iter().map(ImpalaModel::model_name).collect();
        assert_eq!(names, vec!["Sales", "Shops"]);
    }
}
