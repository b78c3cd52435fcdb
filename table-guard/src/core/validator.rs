//! Compiling a rule configuration and evaluating it.

use super::provider::{ColumnValueProvider, TableSnapshot};
use super::result::{ValidationError, ValidationMessage, HEADER_LENGTH, HEADER_MATCH};
use crate::config::{Field, FieldType, RuleConfiguration};
use crate::error::Result;
use crate::logging::{truncate_field, LogConfig};
use crate::rules::{
    DatePattern, FullMatch, Rule, RuleContext, RuleKind, SharedScriptEngine, UniquenessIndex,
};
use std::collections::{BTreeMap, HashMap};
use std::fmt;
use std::sync::Arc;
use tracing::{debug, instrument};

/// The rules of one column, keyed by kind.
pub type ColumnRules = BTreeMap<RuleKind, Rule>;

/// Compiled rules for every configured column.
#[derive(Debug, Clone, Default)]
pub struct RuleSet {
    columns: HashMap<String, ColumnRules>,
}

impl RuleSet {
    pub fn new() -> Self {
        Self::default()
    }

    /// Compiles the rules of one field.
    pub fn compile_field(field: &Field) -> Result<ColumnRules> {
        let mut rules = ColumnRules::new();
        let mut add = |rule: Rule| {
            rules.insert(rule.kind(), rule);
        };

        let constraints = field.constraints.clone().unwrap_or_default();
        if constraints.required {
            add(Rule::NotEmpty);
        }
        if constraints.unique {
            add(Rule::Unique);
        }

        match field.field_type {
            Some(FieldType::Integer) => add(Rule::Integer),
            Some(FieldType::Number) => add(Rule::Number),
            Some(FieldType::String) => {
                if let Some(format) = field.string_format() {
                    add(Rule::Format(format));
                }
            }
            _ => {}
        }
        if let Some(pattern) = field.temporal_format() {
            add(Rule::Date(DatePattern::new(pattern)?));
        }

        if let Some(min) = constraints.min_length {
            add(Rule::MinLength(min));
        }
        if let Some(max) = constraints.max_length {
            add(Rule::MaxLength(max));
        }
        if let Some(pattern) = constraints.pattern.filter(|p| !p.is_empty()) {
            add(Rule::Regexp(FullMatch::new(&field.name, pattern)?));
        }
        if let Some(values) = constraints.enumeration.filter(|v| !v.is_empty()) {
            add(Rule::Enumeration(values));
        }
        if let Some(body) = field.script_body() {
            add(Rule::Script(body.to_string()));
        }

        Ok(rules)
    }

    /// Compiles every field of `config`.
    pub fn compile(config: &RuleConfiguration) -> Result<Self> {
        let mut set = Self::new();
        for field in &config.fields {
            set.replace_column(&field.name, Self::compile_field(field)?);
        }
        Ok(set)
    }

    /// Adds `rule`, replacing any rule of the same kind on `column`.
    pub fn insert(&mut self, column: impl Into<String>, rule: Rule) -> Option<Rule> {
        self.columns
            .entry(column.into())
            .or_default()
            .insert(rule.kind(), rule)
    }

    /// Replaces all rules of `column`; an empty set removes the column.
    pub fn replace_column(&mut self, column: &str, rules: ColumnRules) {
        if rules.is_empty() {
            self.columns.remove(column);
        } else {
            self.columns.insert(column.to_string(), rules);
        }
    }

    pub fn column(&self, column: &str) -> Option<&ColumnRules> {
        self.columns.get(column)
    }

    pub fn has_rule(&self, column: &str, kind: RuleKind) -> bool {
        self.columns
            .get(column)
            .is_some_and(|rules| rules.contains_key(&kind))
    }

    pub fn columns(&self) -> impl Iterator<Item = &str> {
        self.columns.keys().map(String::as_str)
    }

    /// Total number of rules across all columns.
    pub fn len(&self) -> usize {
        self.columns.values().map(BTreeMap::len).sum()
    }

    pub fn is_empty(&self) -> bool {
        self.columns.is_empty()
    }
}

/// Validates cells, headers and whole tables against a rule configuration.
///
/// # Examples
///
/// ```rust
/// use std::sync::Arc;
/// use table_guard::config::RuleConfiguration;
/// use table_guard::core::{TableSnapshot, Validator};
///
/// let config = RuleConfiguration::from_json(
///     r#"{ "fields": [ { "name": "id", "type": "integer",
///                        "constraints": { "required": true, "unique": true } } ] }"#,
/// ).unwrap();
/// let table = Arc::new(TableSnapshot::from_records(["id"], [["1"], ["x"], ["1"]]));
/// let validator = Validator::build(config, table.clone()).unwrap();
///
/// assert!(validator.needs_full_table_revalidation("id"));
/// let errors = validator.validate_table(&table).unwrap();
/// assert_eq!(errors.len(), 3);
/// ```
#[derive(Clone)]
pub struct Validator {
    config: Option<RuleConfiguration>,
    rules: RuleSet,
    provider: Option<Arc<dyn ColumnValueProvider>>,
    scripts: Option<SharedScriptEngine>,
    log_config: LogConfig,
}

impl fmt::Debug for Validator {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Validator")
            .field("config", &self.config)
            .field("rules", &self.rules)
            .field("has_provider", &self.provider.is_some())
            .field("has_script_engine", &self.scripts.is_some())
            .finish_non_exhaustive()
    }
}

impl Validator {
    /// Starts building a validator for `config`.
    pub fn builder(config: RuleConfiguration) -> ValidatorBuilder {
        ValidatorBuilder::new(Some(config))
    }

    /// Compiles `config` with `provider` for cross-row checks.
    pub fn build(
        config: RuleConfiguration,
        provider: Arc<dyn ColumnValueProvider>,
    ) -> Result<Self> {
        Self::builder(config).provider(provider).build()
    }

    /// A validator without configuration: no rules and no header check.
    pub fn empty() -> Self {
        Self {
            config: None,
            rules: RuleSet::new(),
            provider: None,
            scripts: None,
            log_config: LogConfig::default(),
        }
    }

    pub fn configuration(&self) -> Option<&RuleConfiguration> {
        self.config.as_ref()
    }

    pub fn rules(&self) -> &RuleSet {
        &self.rules
    }

    /// Checks one cell with the configured provider.
    ///
    /// Every rule of `column` runs; the messages of failing rules are
    /// collected into one error stamped with `row` and `column`.
    pub fn is_valid(&self, row: usize, column: &str, value: Option<&str>) -> Option<ValidationError> {
        let mut uniqueness = UniquenessIndex::new();
        self.check_cell(self.provider.as_deref(), &mut uniqueness, row, column, value)
    }

    /// Compares `header` against the configured field names.
    ///
    /// A count mismatch yields a single `header-length` message
    /// (`[actual, expected]`); otherwise each differing position yields a
    /// `header-match` message (`[position, expected, actual]`).
    pub fn is_header_valid<S: AsRef<str>>(&self, header: &[S]) -> Option<ValidationError> {
        let config = self.config.as_ref()?;
        let expected = config.header_names();

        if expected.len() != header.len() {
            return ValidationError::for_header(vec![ValidationMessage::with_params(
                HEADER_LENGTH,
                [header.len().to_string(), expected.len().to_string()],
            )]);
        }

        let mut messages = Vec::new();
        for (position, (expected, actual)) in expected.iter().zip(header).enumerate() {
            let actual: &str = actual.as_ref();
            if *expected != actual {
                messages.push(ValidationMessage::with_params(
                    HEADER_MATCH,
                    [position.to_string(), expected.to_string(), actual.to_string()],
                ));
            }
        }
        ValidationError::for_header(messages)
    }

    /// Returns true if a change in `column` can affect other rows' results.
    pub fn needs_full_table_revalidation(&self, column: &str) -> bool {
        self.rules.has_rule(column, RuleKind::Unique)
    }

    /// Rebuilds the rules of `column` from the current configuration.
    ///
    /// A column without a field in the configuration ends up with no rules.
    pub fn reinitialize_column(&mut self, column: &str) -> Result<()> {
        let rules = match self.config.as_ref().and_then(|c| c.field(column)) {
            Some(field) => RuleSet::compile_field(field)?,
            None => ColumnRules::new(),
        };
        debug!(column, rules = rules.len(), "Reinitialized column rules");
        self.rules.replace_column(column, rules);
        Ok(())
    }

    /// Stores `field` in the configuration and rebuilds its column.
    ///
    /// The validator is left unchanged if the field does not compile.
    pub fn replace_field(&mut self, field: Field) -> Result<()> {
        field.validate()?;
        RuleSet::compile_field(&field)?;
        let column = field.name.clone();
        self.config
            .get_or_insert_with(RuleConfiguration::default)
            .upsert_field(field);
        self.reinitialize_column(&column)
    }

    /// Runs a full pass over `snapshot`.
    ///
    /// The snapshot serves as the value provider for cross-row checks. The
    /// header error, if any, comes first, followed by cell errors in row then
    /// column order.
    pub fn validate_table(&self, snapshot: &TableSnapshot) -> Result<Vec<ValidationError>> {
        Ok(self
            .run_pass(snapshot, &|| false)?
            .unwrap_or_default())
    }

    /// Runs a full pass, returning `Ok(None)` if `should_stop` reports true
    /// between rows.
    #[instrument(skip(self, snapshot, should_stop), fields(
        rows = snapshot.rows.len(),
        columns = snapshot.header.len()
    ))]
    pub(crate) fn run_pass(
        &self,
        snapshot: &TableSnapshot,
        should_stop: &dyn Fn() -> bool,
    ) -> Result<Option<Vec<ValidationError>>> {
        snapshot.validate()?;

        let mut errors = Vec::new();
        errors.extend(self.is_header_valid(&snapshot.header));

        let mut uniqueness = UniquenessIndex::new();
        for row in &snapshot.rows {
            if should_stop() {
                debug!(row = row.index, "Full pass stopped early");
                return Ok(None);
            }
            for column in &snapshot.header {
                errors.extend(self.check_cell(
                    Some(snapshot),
                    &mut uniqueness,
                    row.index,
                    column,
                    row.get(column),
                ));
            }
        }

        if self.log_config.log_pass_summaries {
            crate::perf_debug!(
                self.log_config,
                errors = errors.len(),
                unique_columns = uniqueness.scanned_columns(),
                "Full pass finished"
            );
        }
        Ok(Some(errors))
    }

    fn check_cell(
        &self,
        provider: Option<&dyn ColumnValueProvider>,
        uniqueness: &mut UniquenessIndex,
        row: usize,
        column: &str,
        value: Option<&str>,
    ) -> Option<ValidationError> {
        let rules = self.rules.column(column)?;
        let mut ctx = RuleContext {
            column,
            provider,
            uniqueness,
            scripts: self.scripts.as_deref(),
        };

        let messages: Vec<ValidationMessage> = rules
            .values()
            .filter(|rule| rule.can_be_checked(value))
            .filter_map(|rule| rule.evaluate(&mut ctx, row, value))
            .collect();

        if !messages.is_empty() {
            crate::log_rule!(
                self.log_config,
                row,
                column,
                value = %truncate_field(value.unwrap_or_default(), self.log_config.max_field_length),
                failures = messages.len(),
                "Cell failed validation"
            );
        }
        ValidationError::for_cell(row, column, messages)
    }
}

/// Builder for [`Validator`].
#[derive(Default)]
pub struct ValidatorBuilder {
    config: Option<RuleConfiguration>,
    provider: Option<Arc<dyn ColumnValueProvider>>,
    scripts: Option<SharedScriptEngine>,
    log_config: LogConfig,
}

impl ValidatorBuilder {
    fn new(config: Option<RuleConfiguration>) -> Self {
        Self {
            config,
            ..Self::default()
        }
    }

    /// Sets the table access used by [`Validator::is_valid`].
    pub fn provider(mut self, provider: Arc<dyn ColumnValueProvider>) -> Self {
        self.provider = Some(provider);
        self
    }

    /// Sets the evaluator for scripted rules.
    pub fn script_engine(mut self, engine: SharedScriptEngine) -> Self {
        self.scripts = Some(engine);
        self
    }

    pub fn log_config(mut self, log_config: LogConfig) -> Self {
        self.log_config = log_config;
        self
    }

    /// Validates the configuration and compiles its rules.
    pub fn build(self) -> Result<Validator> {
        let rules = match &self.config {
            Some(config) => {
                config.validate()?;
                RuleSet::compile(config)?
            }
            None => RuleSet::new(),
        };
        debug!(
            columns = rules.columns().count(),
            rules = rules.len(),
            "Compiled rule set"
        );
        Ok(Validator {
            config: self.config,
            rules,
            provider: self.provider,
            scripts: self.scripts,
            log_config: self.log_config,
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::{Constraints, StringFormat};
    use crate::core::result::{INTEGER, MAX_LENGTH, MIN_LENGTH, NOT_EMPTY, UNIQUE};

    fn config(fields: Vec<Field>) -> RuleConfiguration {
        RuleConfiguration::new(fields)
    }

    fn names(names: &[&str]) -> RuleConfiguration {
        config(names.iter().map(|n| Field::new(*n)).collect())
    }

    #[test]
    fn test_compile_field() {
        let field = Field::new("code")
            .with_type(FieldType::String)
            .with_format("uuid")
            .with_constraints(
                Constraints::required()
                    .with_unique(true)
                    .with_min_length(1)
                    .with_max_length(36)
                    .with_pattern("[0-9a-f-]+")
                    .with_enumeration(["a"]),
            )
            .with_script("value != null");
        let rules = RuleSet::compile_field(&field).unwrap();
        let kinds: Vec<RuleKind> = rules.keys().copied().collect();
        assert_eq!(
            kinds,
            vec![
                RuleKind::NotEmpty,
                RuleKind::Unique,
                RuleKind::MinLength,
                RuleKind::MaxLength,
                RuleKind::Regexp,
                RuleKind::Format,
                RuleKind::Enumeration,
                RuleKind::Script,
            ]
        );
        assert_eq!(rules[&RuleKind::Format], Rule::Format(StringFormat::Uuid));
    }

    #[test]
    fn test_unknown_or_absent_type_adds_no_type_rule() {
        assert!(RuleSet::compile_field(&Field::new("a")).unwrap().is_empty());
        assert!(RuleSet::compile_field(&Field::new("a").with_type(FieldType::Other))
            .unwrap()
            .is_empty());
    }

    #[test]
    fn test_temporal_type_without_format_uses_default() {
        let rules = RuleSet::compile_field(&Field::new("d").with_type(FieldType::Date)).unwrap();
        match &rules[&RuleKind::Date] {
            Rule::Date(pattern) => assert_eq!(pattern.pattern(), "yyyy-MM-dd"),
            other => panic!("unexpected rule {other:?}"),
        }
    }

    #[test]
    fn test_build_rejects_bad_pattern() {
        let result = Validator::builder(config(vec![
            Field::new("a").with_constraints(Constraints::default().with_pattern("("))
        ]))
        .build();
        assert!(result.is_err());
    }

    #[test]
    fn test_is_valid_accumulates_messages() {
        let validator = Validator::builder(config(vec![Field::new("n")
            .with_type(FieldType::Integer)
            .with_constraints(Constraints::default().with_max_length(2))]))
        .build()
        .unwrap();

        let error = validator.is_valid(3, "n", Some("abc")).unwrap();
        assert_eq!(error.row, Some(3));
        assert_eq!(error.column.as_deref(), Some("n"));
        assert_eq!(
            error.messages,
            vec![
                ValidationMessage::new(INTEGER),
                ValidationMessage::with_params(MAX_LENGTH, ["2"]),
            ]
        );
        assert!(validator.is_valid(3, "n", Some("12")).is_none());
    }

    #[test]
    fn test_empty_value_only_checks_not_empty() {
        let validator = Validator::builder(config(vec![Field::new("n")
            .with_type(FieldType::Integer)
            .with_constraints(Constraints::default().with_min_length(3))]))
        .build()
        .unwrap();
        assert!(validator.is_valid(0, "n", Some("")).is_none());
        assert!(validator.is_valid(0, "n", None).is_none());

        let required = Validator::builder(config(vec![Field::new("n")
            .with_type(FieldType::Integer)
            .with_constraints(Constraints::required().with_min_length(3))]))
        .build()
        .unwrap();
        let error = required.is_valid(0, "n", Some("")).unwrap();
        assert_eq!(error.messages, vec![ValidationMessage::new(NOT_EMPTY)]);
    }

    #[test]
    fn test_unconfigured_column_is_valid() {
        let validator = Validator::builder(names(&["a"])).build().unwrap();
        assert!(validator.is_valid(0, "zzz", None).is_none());
    }

    #[test]
    fn test_header_checks() {
        let empty = Validator::builder(names(&[])).build().unwrap();
        assert!(empty.is_header_valid::<&str>(&[]).is_none());

        let validator = Validator::builder(names(&["a"])).build().unwrap();
        assert!(validator.is_header_valid(&["a"]).is_none());

        let mismatch = validator.is_header_valid(&["b"]).unwrap();
        assert_eq!(mismatch.row, None);
        assert_eq!(
            mismatch.messages,
            vec![ValidationMessage::with_params(HEADER_MATCH, ["0", "a", "b"])]
        );

        let length = validator.is_header_valid(&["a", "b"]).unwrap();
        assert_eq!(
            length.messages,
            vec![ValidationMessage::with_params(HEADER_LENGTH, ["2", "1"])]
        );
    }

    #[test]
    fn test_header_reports_every_differing_position() {
        let validator = Validator::builder(names(&["a", "b", "c"])).build().unwrap();
        let error = validator.is_header_valid(&["a", "x", "y"]).unwrap();
        assert_eq!(error.messages.len(), 2);
        assert_eq!(error.messages[1].params, vec!["2", "c", "y"]);
    }

    #[test]
    fn test_empty_validator_skips_header_check() {
        assert!(Validator::empty().is_header_valid(&["anything"]).is_none());
    }

    #[test]
    fn test_needs_full_table_revalidation() {
        let validator = Validator::builder(config(vec![
            Field::new("id").with_constraints(Constraints::unique()),
            Field::new("name").with_constraints(Constraints::required()),
        ]))
        .build()
        .unwrap();
        assert!(validator.needs_full_table_revalidation("id"));
        assert!(!validator.needs_full_table_revalidation("name"));
        assert!(!validator.needs_full_table_revalidation("missing"));
    }

    #[test]
    fn test_is_valid_unique_uses_provider() {
        let table = Arc::new(TableSnapshot::from_records(["id"], [["X"], ["Y"], ["X"]]));
        let validator = Validator::build(
            config(vec![Field::new("id").with_constraints(Constraints::unique())]),
            table,
        )
        .unwrap();

        let error = validator.is_valid(2, "id", Some("X")).unwrap();
        assert_eq!(
            error.messages,
            vec![ValidationMessage::with_params(UNIQUE, ["X", "1"])]
        );
    }

    #[test]
    fn test_reinitialize_column_rebuilds_from_config() {
        let mut validator = Validator::builder(config(vec![
            Field::new("a").with_constraints(Constraints::required()),
            Field::new("b").with_constraints(Constraints::required()),
        ]))
        .build()
        .unwrap();

        validator
            .replace_field(Field::new("a").with_constraints(Constraints::default().with_min_length(2)))
            .unwrap();

        assert!(!validator.rules().has_rule("a", RuleKind::NotEmpty));
        assert!(validator.rules().has_rule("a", RuleKind::MinLength));
        assert!(validator.rules().has_rule("b", RuleKind::NotEmpty));
        assert_eq!(
            validator.is_valid(0, "a", Some("x")).unwrap().messages,
            vec![ValidationMessage::with_params(MIN_LENGTH, ["2"])]
        );
    }

    #[test]
    fn test_reinitialize_unconfigured_column_drops_rules() {
        let mut validator = Validator::builder(names(&["a"])).build().unwrap();
        validator.rules.insert("ghost", Rule::NotEmpty);
        validator.reinitialize_column("ghost").unwrap();
        assert!(validator.rules().column("ghost").is_none());
    }

    #[test]
    fn test_replace_field_rejects_invalid_field() {
        let mut validator = Validator::builder(names(&["a"])).build().unwrap();
        let bad = Field::new("a").with_constraints(Constraints::default().with_pattern("["));
        assert!(validator.replace_field(bad).is_err());
        assert_eq!(
            validator.configuration().unwrap().field("a"),
            Some(&Field::new("a"))
        );
    }

    #[test]
    fn test_validate_table_orders_errors() {
        let validator = Validator::builder(config(vec![
            Field::new("a").with_constraints(Constraints::required()),
            Field::new("b").with_type(FieldType::Integer),
        ]))
        .build()
        .unwrap();
        let table = TableSnapshot::from_records(["a", "b", "c"], [["", "x", ""], ["ok", "1", ""], ["", "2", ""]]);

        let errors = validator.validate_table(&table).unwrap();
        let positions: Vec<(Option<usize>, Option<&str>)> = errors
            .iter()
            .map(|e| (e.row, e.column.as_deref()))
            .collect();
        assert_eq!(
            positions,
            vec![
                (None, None),
                (Some(0), Some("a")),
                (Some(0), Some("b")),
                (Some(2), Some("a")),
            ]
        );
    }

    #[test]
    fn test_validate_table_rejects_duplicate_header() {
        let validator = Validator::empty();
        let table = TableSnapshot::new(["a", "a"]);
        assert!(validator.validate_table(&table).is_err());
    }

    #[test]
    fn test_run_pass_stops_when_asked() {
        let validator = Validator::builder(names(&["a"])).build().unwrap();
        let table = TableSnapshot::from_records(["a"], [["1"]]);
        assert_eq!(validator.run_pass(&table, &|| true).unwrap(), None);
    }
}
