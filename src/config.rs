// src/config.rs
use crate::api::{FetchPlan, ResourceKind, SortKey, TransportSettings};
use crate::error::AppError;
use crate::table::{Condition, UnsupportedKindPolicy};
use crate::types::{ApiKey, NotionId, ValidationError};
use clap::{Args, Parser, Subcommand};
use indexmap::IndexMap;
use std::path::PathBuf;
use std::time::Duration;

/// Environment variable holding one or more comma-separated API tokens.
pub const API_KEY_ENV: &str = "NOTION_API_KEY";

/// Everything a [`crate::NotionTable`] needs to reach and shape its resource.
#[derive(Debug, Clone, PartialEq)]
pub struct TableConfig {
    pub resource_id: NotionId,
    pub tokens: Vec<ApiKey>,
    pub kind: ResourceKind,
    pub sorts: Vec<SortKey>,
    /// Follow pagination to the end instead of stopping after one page.
    pub get_all: bool,
    /// Fetch the content of every row as a nested page table.
    pub recursive: bool,
    /// Where image blocks are saved; `None` disables downloading.
    pub download_dir: Option<PathBuf>,
    pub unsupported_kinds: UnsupportedKindPolicy,
    pub transport: TransportSettings,
}

impl TableConfig {
    pub fn new(resource_id: NotionId, tokens: Vec<ApiKey>) -> Self {
        Self {
            resource_id,
            tokens,
            kind: ResourceKind::Database,
            sorts: Vec::new(),
            get_all: true,
            recursive: false,
            download_dir: None,
            unsupported_kinds: UnsupportedKindPolicy::default(),
            transport: TransportSettings::default(),
        }
    }

    /// Treats the resource as a page whose blocks are the rows.
    pub fn as_page(mut self, is_page: bool) -> Self {
        self.kind = if is_page {
            ResourceKind::Page
        } else {
            ResourceKind::Database
        };
        self
    }

    /// Sorts database queries by `columns`. `reverse` holds one descending
    /// flag per column, or nothing for all ascending.
    pub fn with_sort(mut self, columns: &[&str], reverse: &[bool]) -> Result<Self, ValidationError> {
        if !reverse.is_empty() && reverse.len() != columns.len() {
            return Err(ValidationError::SortFlagsMismatch {
                columns: columns.len(),
                flags: reverse.len(),
            });
        }

        self.sorts = columns
            .iter()
            .enumerate()
            .map(|(i, column)| SortKey {
                property: column.to_string(),
                descending: reverse.get(i).copied().unwrap_or(false),
            })
            .collect();
        Ok(self)
    }

    pub fn with_get_all(mut self, get_all: bool) -> Self {
        self.get_all = get_all;
        self
    }

    pub fn with_recursion(mut self, recursive: bool) -> Self {
        self.recursive = recursive;
        self
    }

    pub fn with_image_downloads(mut self, dir: impl Into<PathBuf>) -> Self {
        self.download_dir = Some(dir.into());
        self
    }

    pub fn with_retries(mut self, retries: u32) -> Self {
        self.transport.retry = self.transport.retry.with_max_retries(retries);
        self
    }

    pub fn with_timeout(mut self, timeout: Duration) -> Self {
        self.transport.call_timeout = timeout;
        self
    }

    pub fn with_trust_env(mut self, trust_env: bool) -> Self {
        self.transport.trust_env = trust_env;
        self
    }

    pub fn with_unsupported_kinds(mut self, policy: UnsupportedKindPolicy) -> Self {
        self.unsupported_kinds = policy;
        self
    }

    pub fn fetch_plan(&self) -> FetchPlan {
        FetchPlan {
            id: self.resource_id.clone(),
            kind: self.kind,
            sorts: self.sorts.clone(),
            get_all: self.get_all,
        }
    }

    /// Configuration of the nested page table read for row `id`.
    pub fn child(&self, id: NotionId) -> Self {
        Self {
            resource_id: id,
            tokens: self.tokens.clone(),
            kind: ResourceKind::Page,
            sorts: Vec::new(),
            get_all: true,
            recursive: self.recursive,
            download_dir: self.download_dir.clone(),
            unsupported_kinds: self.unsupported_kinds,
            transport: self.transport,
        }
    }

    /// Resolves a configuration from CLI input and environment.
    pub fn resolve(cli: &CommandLineInput) -> Result<Self, AppError> {
        let raw_tokens = std::env::var(API_KEY_ENV).map_err(|_| {
            AppError::MissingConfiguration(format!("{} environment variable not set", API_KEY_ENV))
        })?;
        Self::from_cli(cli, &raw_tokens)
    }

    /// Builds a configuration from CLI input and a comma-separated token list.
    pub fn from_cli(cli: &CommandLineInput, raw_tokens: &str) -> Result<Self, AppError> {
        let tokens = ApiKey::parse_list(raw_tokens)?;
        let resource_id = NotionId::parse(&cli.notion_input)?;

        let (columns, reverse): (Vec<&str>, Vec<bool>) =
            cli.sort.iter().map(|spec| parse_sort(spec)).unzip();

        let mut config = Self::new(resource_id, tokens)
            .as_page(cli.page)
            .with_sort(&columns, &reverse)?
            .with_get_all(!cli.no_get_all)
            .with_recursion(cli.recursive)
            .with_retries(cli.retries)
            .with_timeout(Duration::from_secs(cli.timeout))
            .with_trust_env(cli.trust_env);

        if let Some(dir) = &cli.download {
            config = config.with_image_downloads(dir);
        }
        if cli.strict {
            config = config.with_unsupported_kinds(UnsupportedKindPolicy::Fail);
        }
        Ok(config)
    }
}

/// Splits `COL` or `COL:desc` into the column and its descending flag.
fn parse_sort(spec: &str) -> (&str, bool) {
    match spec.rsplit_once(':') {
        Some((column, "desc")) => (column, true),
        Some((column, "asc")) => (column, false),
        _ => (spec, false),
    }
}

/// Splits `COL=VALUE` at the first `=`.
pub fn parse_assignment(input: &str) -> Result<(String, String), ValidationError> {
    input
        .split_once('=')
        .filter(|(column, _)| !column.is_empty())
        .map(|(column, value)| (column.to_string(), value.to_string()))
        .ok_or_else(|| ValidationError::InvalidAssignment {
            input: input.to_string(),
        })
}

/// Parses a list of `COL=VALUE` assignments, keeping their order.
pub fn parse_assignments(inputs: &[String]) -> Result<IndexMap<String, String>, ValidationError> {
    inputs.iter().map(|input| parse_assignment(input)).collect()
}

/// Parsed and validated command-line input.
#[derive(Parser, Debug)]
#[command(author, version, about, long_about = None)]
pub struct CommandLineInput {
    /// Notion database or page URL or ID (e.g., "https://www.notion.so/...")
    pub notion_input: String,

    /// Read the resource as a page: its blocks become the rows
    #[arg(long, default_value_t = false)]
    pub page: bool,

    /// Fetch each row's content as a nested table
    #[arg(long, default_value_t = false)]
    pub recursive: bool,

    /// Sort database rows by a column, optionally descending (repeatable)
    #[arg(long, value_name = "COL[:desc]")]
    pub sort: Vec<String>,

    /// Stop after the first page of results
    #[arg(long, default_value_t = false)]
    pub no_get_all: bool,

    /// Retries per call on network failures and transient statuses
    #[arg(long, default_value_t = crate::constants::DEFAULT_RETRIES)]
    pub retries: u32,

    /// Per-call timeout in seconds
    #[arg(long, default_value_t = 10)]
    pub timeout: u64,

    /// Download image blocks into this directory
    #[arg(long, value_name = "DIR")]
    pub download: Option<PathBuf>,

    /// Honor proxy settings from the environment
    #[arg(long, default_value_t = false)]
    pub trust_env: bool,

    /// Fail on unsupported property or block kinds instead of warning
    #[arg(long, default_value_t = false)]
    pub strict: bool,

    /// Enable verbose logging (debug level)
    #[arg(short, long, default_value_t = false)]
    pub verbose: bool,

    #[command(subcommand)]
    pub command: TableCommand,
}

/// Row selection shared by the querying and mutating commands.
#[derive(Args, Debug, Clone, Default)]
pub struct FilterArgs {
    /// Keep rows whose column equals the value (repeatable)
    #[arg(long = "where", value_name = "COL=VALUE")]
    pub equals: Vec<String>,

    /// Keep rows whose column matches the regular expression (repeatable)
    #[arg(long = "match", value_name = "COL=REGEX")]
    pub patterns: Vec<String>,
}

impl FilterArgs {
    pub fn to_condition(&self) -> Result<Condition, AppError> {
        let mut condition = Condition::new();
        for input in &self.equals {
            let (column, value) = parse_assignment(input)?;
            condition = condition.eq(column, value);
        }
        for input in &self.patterns {
            let (column, pattern) = parse_assignment(input)?;
            condition = condition.matches(column, &pattern)?;
        }
        Ok(condition)
    }
}

#[derive(Subcommand, Debug, Clone)]
pub enum TableCommand {
    /// Print the whole table as JSON
    Table,
    /// Print the column schema as JSON
    Schema,
    /// Print selected columns of matching rows
    Query {
        /// Columns to project (repeatable); all columns when omitted
        #[arg(long)]
        select: Vec<String>,
        #[command(flatten)]
        filter: FilterArgs,
    },
    /// Create a database row
    Insert {
        #[arg(value_name = "COL=VALUE")]
        values: Vec<String>,
    },
    /// Overwrite columns of matching rows
    Update {
        #[arg(long, value_name = "COL=VALUE", required = true)]
        set: Vec<String>,
        #[command(flatten)]
        filter: FilterArgs,
    },
    /// Append text to columns of matching rows
    Append {
        #[arg(long, value_name = "COL=VALUE", required = true)]
        set: Vec<String>,
        #[command(flatten)]
        filter: FilterArgs,
    },
    /// Delete matching rows
    Delete {
        #[command(flatten)]
        filter: FilterArgs,
    },
}

#[cfg(test)]
mod tests {
    use super::*;

    const TOKENS: &str = "secret_config_test_token_one, secret_config_test_token_two";

    fn id() -> NotionId {
        NotionId::parse("12345678123456781234567812345678").unwrap()
    }

    #[test]
    fn test_defaults() {
        let config = TableConfig::new(id(), Vec::new());
        assert_eq!(config.kind, ResourceKind::Database);
        assert!(config.get_all);
        assert!(!config.recursive);
        assert!(config.download_dir.is_none());
        assert_eq!(config.transport.retry.max_retries, 3);
        assert_eq!(config.transport.call_timeout, Duration::from_secs(10));
        assert!(!config.transport.trust_env);
        assert_eq!(config.unsupported_kinds, UnsupportedKindPolicy::Warn);
    }

    #[test]
    fn test_sort_flags() {
        let config = TableConfig::new(id(), Vec::new())
            .with_sort(&["Name", "Status"], &[false, true])
            .unwrap();
        assert_eq!(
            config.sorts,
            vec![SortKey::ascending("Name"), SortKey::descending("Status")]
        );

        let all_ascending = TableConfig::new(id(), Vec::new())
            .with_sort(&["Name"], &[])
            .unwrap();
        assert!(!all_ascending.sorts[0].descending);

        assert!(matches!(
            TableConfig::new(id(), Vec::new()).with_sort(&["Name"], &[true, false]),
            Err(ValidationError::SortFlagsMismatch { columns: 1, flags: 2 })
        ));
    }

    #[test]
    fn test_child_config_is_a_page() {
        let parent = TableConfig::new(id(), Vec::new())
            .with_sort(&["Name"], &[])
            .unwrap()
            .with_get_all(false)
            .with_recursion(true)
            .with_image_downloads("images");
        let child_id = NotionId::parse("abcdefabcdefabcdefabcdefabcdefab").unwrap();
        let child = parent.child(child_id.clone());

        assert_eq!(child.resource_id, child_id);
        assert_eq!(child.kind, ResourceKind::Page);
        assert!(child.sorts.is_empty());
        assert!(child.get_all);
        assert!(child.recursive);
        assert_eq!(child.download_dir, Some(PathBuf::from("images")));
    }

    #[test]
    fn test_from_cli() {
        let cli = CommandLineInput::try_parse_from([
            "notion-table",
            "12345678123456781234567812345678",
            "--sort",
            "Name",
            "--sort",
            "Created:desc",
            "--no-get-all",
            "--retries",
            "5",
            "--strict",
            "query",
            "--select",
            "Name",
            "--where",
            "Status=done",
        ])
        .unwrap();

        let config = TableConfig::from_cli(&cli, TOKENS).unwrap();
        assert_eq!(config.tokens.len(), 2);
        assert_eq!(
            config.sorts,
            vec![SortKey::ascending("Name"), SortKey::descending("Created")]
        );
        assert!(!config.get_all);
        assert_eq!(config.transport.retry.max_retries, 5);
        assert_eq!(config.unsupported_kinds, UnsupportedKindPolicy::Fail);

        let TableCommand::Query { select, filter } = cli.command else {
            panic!("expected query command");
        };
        assert_eq!(select, vec!["Name"]);
        assert!(!filter.to_condition().unwrap().is_empty());
    }

    #[test]
    fn test_assignments() {
        assert_eq!(
            parse_assignment("Status=in=progress").unwrap(),
            ("Status".to_string(), "in=progress".to_string())
        );
        assert_eq!(
            parse_assignment("Notes=").unwrap(),
            ("Notes".to_string(), String::new())
        );
        assert!(parse_assignment("no-equals").is_err());
        assert!(parse_assignment("=value").is_err());

        let values =
            parse_assignments(&["B=2".to_string(), "A=1".to_string()]).unwrap();
        assert_eq!(values.keys().collect::<Vec<_>>(), vec!["B", "A"]);
    }
}
