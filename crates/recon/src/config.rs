use std::collections::HashSet;
use std::path::Path;

use serde::{Deserialize, Serialize};

use crate::error::ReconError;
use crate::key::DEFAULT_SEPARATOR;
use crate::model::Snapshot;

/// Ledger major-code groups compared by the standard OA-2 report.
pub const DEFAULT_PREFIXES: [&str; 4] = ["1202", "9110", "2401", "2103"];

/// Excel's hard limit on worksheet name length.
const MAX_SHEET_NAME_CHARS: usize = 31;

// ---------------------------------------------------------------------------
// Top-level config
// ---------------------------------------------------------------------------

#[derive(Debug, Clone, Deserialize, Serialize)]
pub struct ReconConfig {
    #[serde(default = "default_name")]
    pub name: String,
    /// Joins the components of entity and account keys.
    #[serde(default = "default_separator")]
    pub separator: String,
    #[serde(default)]
    pub columns: ColumnMapping,
    #[serde(default = "default_policies")]
    pub policies: Vec<MatchPolicy>,
}

impl Default for ReconConfig {
    fn default() -> Self {
        Self {
            name: default_name(),
            separator: default_separator(),
            columns: ColumnMapping::default(),
            policies: default_policies(),
        }
    }
}

fn default_name() -> String {
    "OA-2".into()
}

fn default_separator() -> String {
    DEFAULT_SEPARATOR.into()
}

fn default_policies() -> Vec<MatchPolicy> {
    DEFAULT_PREFIXES.iter().map(|p| MatchPolicy::prefix_group(*p)).collect()
}

// ---------------------------------------------------------------------------
// Column mapping
// ---------------------------------------------------------------------------

/// Header names of the input columns. Every field but `amount` is required
/// to be present in each snapshot.
#[derive(Debug, Clone, PartialEq, Eq, Deserialize, Serialize)]
#[serde(default)]
pub struct ColumnMapping {
    pub case_id: String,
    pub claimant_id: String,
    pub claimant_name: String,
    pub major: String,
    pub sub_account: String,
    pub amount: String,
}

impl Default for ColumnMapping {
    fn default() -> Self {
        Self {
            case_id: "EXPEDIENTE / CASO".into(),
            claimant_id: "NUM_DOC_DEMANDANTE".into(),
            claimant_name: "DEMANDANTE_NOMBRE".into(),
            major: "MAYOR".into(),
            sub_account: "SUB_CTA".into(),
            amount: "MONTO".into(),
        }
    }
}

impl ColumnMapping {
    /// Identity columns in key order: entity components, then account components.
    pub fn required(&self) -> [&str; 5] {
        [
            self.case_id.as_str(),
            self.claimant_id.as_str(),
            self.claimant_name.as_str(),
            self.major.as_str(),
            self.sub_account.as_str(),
        ]
    }
}

// ---------------------------------------------------------------------------
// Policy
// ---------------------------------------------------------------------------

/// How a comparison table scopes and matches accounts.
///
/// Both variants run the same matching algorithm; they differ only in which
/// aggregated records are in scope.
#[derive(Debug, Clone, PartialEq, Eq, Deserialize, Serialize)]
#[serde(tag = "kind", rename_all = "snake_case")]
pub enum MatchPolicy {
    /// Only accounts whose key starts with `prefix`.
    PrefixGroup {
        prefix: String,
        #[serde(default, skip_serializing_if = "Option::is_none")]
        sheet: Option<String>,
    },
    /// Every account.
    FullKey {
        #[serde(default, skip_serializing_if = "Option::is_none")]
        sheet: Option<String>,
    },
}

impl MatchPolicy {
    pub fn prefix_group(prefix: impl Into<String>) -> Self {
        Self::PrefixGroup { prefix: prefix.into(), sheet: None }
    }

    pub fn full_key() -> Self {
        Self::FullKey { sheet: None }
    }

    /// Account prefix that selects in-scope records ("" = everything).
    pub fn scope(&self) -> &str {
        match self {
            Self::PrefixGroup { prefix, .. } => prefix.as_str(),
            Self::FullKey { .. } => "",
        }
    }

    /// Name of the comparison table (and its report sheet).
    pub fn sheet_name(&self) -> String {
        match self {
            Self::PrefixGroup { sheet: Some(s), .. } | Self::FullKey { sheet: Some(s) } => s.clone(),
            Self::PrefixGroup { prefix, sheet: None } => format!("Comparación {prefix}"),
            Self::FullKey { sheet: None } => "Comparación total".into(),
        }
    }
}

impl std::fmt::Display for MatchPolicy {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::PrefixGroup { prefix, .. } => write!(f, "prefix_group({prefix})"),
            Self::FullKey { .. } => write!(f, "full_key"),
        }
    }
}

// ---------------------------------------------------------------------------
// Parse + Validate
// ---------------------------------------------------------------------------

impl ReconConfig {
    pub fn from_toml(input: &str) -> Result<Self, ReconError> {
        let config: ReconConfig =
            toml::from_str(input).map_err(|e| ReconError::ConfigParse(e.to_string()))?;
        config.validate()?;
        Ok(config)
    }

    /// Read and validate a config file.
    pub fn load(path: &Path) -> Result<Self, ReconError> {
        let input = std::fs::read_to_string(path)
            .map_err(|e| ReconError::Io(format!("cannot read {}: {e}", path.display())))?;
        Self::from_toml(&input)
    }

    pub fn to_toml(&self) -> Result<String, ReconError> {
        toml::to_string_pretty(self).map_err(|e| ReconError::ConfigParse(e.to_string()))
    }

    /// Replace the policy list (e.g. from command-line overrides).
    pub fn with_policies(mut self, policies: Vec<MatchPolicy>) -> Result<Self, ReconError> {
        self.policies = policies;
        self.validate()?;
        Ok(self)
    }

    pub fn validate(&self) -> Result<(), ReconError> {
        if self.separator.is_empty() {
            return Err(ReconError::ConfigValidation("separator must not be empty".into()));
        }

        let columns = &self.columns;
        for (field, value) in [
            ("case_id", &columns.case_id),
            ("claimant_id", &columns.claimant_id),
            ("claimant_name", &columns.claimant_name),
            ("major", &columns.major),
            ("sub_account", &columns.sub_account),
            ("amount", &columns.amount),
        ] {
            if value.trim().is_empty() {
                return Err(ReconError::ConfigValidation(format!(
                    "columns.{field} must not be empty"
                )));
            }
        }

        if self.policies.is_empty() {
            return Err(ReconError::ConfigValidation(
                "at least one policy is required".into(),
            ));
        }

        let mut prefixes = HashSet::new();
        let mut full_key_seen = false;
        let mut sheets = HashSet::new();
        for policy in &self.policies {
            match policy {
                MatchPolicy::PrefixGroup { prefix, .. } => {
                    if !prefixes.insert(prefix.as_str()) {
                        return Err(ReconError::ConfigValidation(format!(
                            "duplicate prefix '{prefix}'"
                        )));
                    }
                }
                MatchPolicy::FullKey { .. } => {
                    if full_key_seen {
                        return Err(ReconError::ConfigValidation(
                            "full_key policy listed more than once".into(),
                        ));
                    }
                    full_key_seen = true;
                }
            }

            let sheet = policy.sheet_name();
            validate_sheet_name(&sheet)?;
            // Excel compares sheet names case-insensitively
            if !sheets.insert(sheet.to_lowercase()) {
                return Err(ReconError::ConfigValidation(format!(
                    "duplicate sheet name '{sheet}'"
                )));
            }
        }

        Ok(())
    }
}

fn validate_sheet_name(name: &str) -> Result<(), ReconError> {
    if name.trim().is_empty() {
        return Err(ReconError::ConfigValidation("sheet name must not be empty".into()));
    }
    if name.chars().count() > MAX_SHEET_NAME_CHARS {
        return Err(ReconError::ConfigValidation(format!(
            "sheet name '{name}' exceeds {MAX_SHEET_NAME_CHARS} characters"
        )));
    }
    if let Some(c) = name.chars().find(|c| "[]:*?/\\".contains(*c)) {
        return Err(ReconError::ConfigValidation(format!(
            "sheet name '{name}' contains invalid character '{c}'"
        )));
    }
    for snapshot in [Snapshot::Past, Snapshot::Current] {
        if name.eq_ignore_ascii_case(snapshot.sheet_name()) {
            return Err(ReconError::ConfigValidation(format!(
                "sheet name '{name}' is reserved for the {snapshot} table"
            )));
        }
    }
    Ok(())
}

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------

#[cfg(test)]
mod tests {
    use super::*;

    const CUSTOM: &str = r#"
name = "Quarterly"
separator = "|"

[columns]
case_id = "CASE"
claimant_id = "DOC"
claimant_name = "NAME"
major = "MAJOR"
sub_account = "SUB"
amount = "AMOUNT"

[[policies]]
kind = "prefix_group"
prefix = "1202"

[[policies]]
kind = "prefix_group"
prefix = "9110"
sheet = "Costas"

[[policies]]
kind = "full_key"
"#;

    #[test]
    fn empty_config_is_the_standard_report() {
        let config = ReconConfig::from_toml("").unwrap();
        assert_eq!(config.name, "OA-2");
        assert_eq!(config.separator, "-");
        assert_eq!(config.columns, ColumnMapping::default());
        let prefixes: Vec<&str> = config.policies.iter().map(|p| p.scope()).collect();
        assert_eq!(prefixes, DEFAULT_PREFIXES);
    }

    #[test]
    fn parse_custom() {
        let config = ReconConfig::from_toml(CUSTOM).unwrap();
        assert_eq!(config.name, "Quarterly");
        assert_eq!(config.separator, "|");
        assert_eq!(config.columns.case_id, "CASE");
        assert_eq!(config.columns.amount, "AMOUNT");
        assert_eq!(config.policies.len(), 3);
        assert_eq!(config.policies[0], MatchPolicy::prefix_group("1202"));
        assert_eq!(config.policies[1].sheet_name(), "Costas");
        assert_eq!(config.policies[2], MatchPolicy::full_key());
    }

    #[test]
    fn partial_columns_keep_defaults() {
        let config = ReconConfig::from_toml("[columns]\namount = \"IMPORTE\"\n").unwrap();
        assert_eq!(config.columns.amount, "IMPORTE");
        assert_eq!(config.columns.major, "MAYOR");
    }

    #[test]
    fn default_round_trips_through_toml() {
        let text = ReconConfig::default().to_toml().unwrap();
        let parsed = ReconConfig::from_toml(&text).unwrap();
        assert_eq!(parsed.policies, ReconConfig::default().policies);
        assert_eq!(parsed.columns, ColumnMapping::default());
    }

    #[test]
    fn sheet_names() {
        assert_eq!(MatchPolicy::prefix_group("2401").sheet_name(), "Comparación 2401");
        assert_eq!(MatchPolicy::full_key().sheet_name(), "Comparación total");
    }

    #[test]
    fn reject_unknown_policy_kind() {
        let err = ReconConfig::from_toml("[[policies]]\nkind = \"fuzzy\"\n").unwrap_err();
        assert!(matches!(err, ReconError::ConfigParse(_)));
    }

    #[test]
    fn reject_empty_policy_list() {
        let err = ReconConfig::from_toml("policies = []\n").unwrap_err();
        assert!(err.to_string().contains("at least one policy"));
    }

    #[test]
    fn reject_duplicate_prefix() {
        let input = r#"
[[policies]]
kind = "prefix_group"
prefix = "1202"

[[policies]]
kind = "prefix_group"
prefix = "1202"
"#;
        let err = ReconConfig::from_toml(input).unwrap_err();
        assert!(err.to_string().contains("duplicate prefix '1202'"));
    }

    #[test]
    fn reject_reserved_sheet_name() {
        let input = r#"
[[policies]]
kind = "full_key"
sheet = "ACTUAL"
"#;
        let err = ReconConfig::from_toml(input).unwrap_err();
        assert!(err.to_string().contains("reserved"));
    }

    #[test]
    fn reject_long_sheet_name() {
        let config = ReconConfig::default()
            .with_policies(vec![MatchPolicy::prefix_group("1".repeat(40))]);
        assert!(config.unwrap_err().to_string().contains("exceeds 31"));
    }

    #[test]
    fn reject_duplicate_sheet_name() {
        let input = r#"
[[policies]]
kind = "prefix_group"
prefix = "1202"
sheet = "Same"

[[policies]]
kind = "full_key"
sheet = "Same"
"#;
        let err = ReconConfig::from_toml(input).unwrap_err();
        assert!(err.to_string().contains("duplicate sheet name"));
    }

    #[test]
    fn reject_empty_separator() {
        let err = ReconConfig::from_toml("separator = \"\"\n").unwrap_err();
        assert!(err.to_string().contains("separator"));
    }

    #[test]
    fn load_missing_file_is_io_error() {
        let err = ReconConfig::load(Path::new("/nonexistent/oa2.toml")).unwrap_err();
        assert!(matches!(err, ReconError::Io(_)));
    }

    #[test]
    fn reject_sheet_names_differing_only_in_case() {
        let err = ReconConfig::default()
            .with_policies(vec![MatchPolicy::prefix_group("a"), MatchPolicy::prefix_group("A")])
            .unwrap_err();
        assert!(err.is_config());
        assert!(err.to_string().contains("duplicate sheet name 'Comparación A'"));
    }

    #[test]
    fn required_columns_in_key_order() {
        let columns = ColumnMapping::default();
        assert_eq!(
            columns.required(),
            ["EXPEDIENTE / CASO", "NUM_DOC_DEMANDANTE", "DEMANDANTE_NOMBRE", "MAYOR", "SUB_CTA"]
        );
    }
}
