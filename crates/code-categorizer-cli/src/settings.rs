use std::path::{Path, PathBuf};

use anyhow::{Context, Result};
use clap::ValueEnum;
use code_categorizer_core::{
    CategorizeJob, ClassifierConfig, ColumnSpec, FallbackLabels, LlmOverrides, TableFormat,
    Taxonomy, CODE_COLUMN,
};
use serde::Deserialize;

/// Preset pairing an input layout with its taxonomy.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Deserialize, ValueEnum)]
#[serde(rename_all = "kebab-case")]
pub enum Profile {
    /// CSV with a `CPT_Code` column, renamed to `Item`; site-of-care taxonomy.
    #[default]
    CodesTable,
    /// Spreadsheet with an `Item` column; surgical taxonomy.
    Workbook,
}

impl Profile {
    fn default_input(self) -> PathBuf {
        match self {
            Self::CodesTable => PathBuf::from("./data/codesTable.csv"),
            Self::Workbook => PathBuf::from("./data/codesTable.xlsx"),
        }
    }

    fn default_output(self) -> PathBuf {
        match self {
            Self::CodesTable => PathBuf::from("./output/output.csv"),
            Self::Workbook => PathBuf::from("./output/output.xlsx"),
        }
    }

    fn default_column(self) -> &'static str {
        match self {
            Self::CodesTable => "CPT_Code",
            Self::Workbook => CODE_COLUMN,
        }
    }

    fn default_taxonomy(self) -> Taxonomy {
        match self {
            Self::CodesTable => Taxonomy::SiteOfCare,
            Self::Workbook => Taxonomy::Surgical,
        }
    }
}

/// Shape of the optional `--config` file (TOML, YAML or JSON).
#[derive(Debug, Clone, Default, Deserialize)]
#[serde(default)]
pub struct FileConfig {
    pub profile: Option<Profile>,
    pub input: Option<PathBuf>,
    pub output: Option<PathBuf>,
    pub code_column: Option<String>,
    pub taxonomy: Option<Taxonomy>,
    pub format: Option<TableFormat>,
    pub labels: FallbackLabels,
    pub llm: LlmOverrides,
}

impl FileConfig {
    pub fn load(path: Option<&Path>) -> Result<Self> {
        let Some(path) = path else {
            return Ok(Self::default());
        };
        config::Config::builder()
            .add_source(config::File::from(path.to_path_buf()))
            .build()
            .and_then(|settings| settings.try_deserialize())
            .with_context(|| format!("failed to load config file {}", path.display()))
    }
}

/// Values taken from command-line flags; `None` means "not given".
#[derive(Debug, Clone, Default)]
pub struct CliOverrides {
    pub profile: Option<Profile>,
    pub input: Option<PathBuf>,
    pub output: Option<PathBuf>,
    pub code_column: Option<String>,
    pub taxonomy: Option<Taxonomy>,
    pub format: Option<TableFormat>,
    pub llm: LlmOverrides,
}

/// Fully resolved settings for one invocation.
#[derive(Debug, Clone)]
pub struct AppConfig {
    pub profile: Profile,
    pub job: CategorizeJob,
    pub classifier: ClassifierConfig,
    pub llm_file: LlmOverrides,
    pub llm_cli: LlmOverrides,
}

impl AppConfig {
    /// Layer profile defaults, then the config file, then CLI flags.
    pub fn resolve(file: FileConfig, cli: CliOverrides) -> Result<Self> {
        let profile = cli.profile.or(file.profile).unwrap_or_default();
        let input = cli
            .input
            .or(file.input)
            .unwrap_or_else(|| profile.default_input());
        let output = cli
            .output
            .or(file.output)
            .unwrap_or_else(|| profile.default_output());
        let source = cli
            .code_column
            .or(file.code_column)
            .unwrap_or_else(|| profile.default_column().to_string());
        let taxonomy = cli
            .taxonomy
            .or(file.taxonomy)
            .unwrap_or_else(|| profile.default_taxonomy());

        let input_format = match cli.format.or(file.format) {
            Some(format) => format,
            None => TableFormat::from_path(&input)?,
        };
        let output_format = TableFormat::from_path(&output).unwrap_or(input_format);
        output_format.check_output_path(&output)?;

        let rename_to = (source != CODE_COLUMN).then(|| CODE_COLUMN.to_string());

        Ok(Self {
            profile,
            job: CategorizeJob {
                input,
                input_format,
                output,
                output_format,
                columns: ColumnSpec { source, rename_to },
            },
            classifier: ClassifierConfig {
                taxonomy,
                fallback: file.labels,
            },
            llm_file: file.llm,
            llm_cli: cli.llm,
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::fs;

    #[test]
    fn codes_table_profile_defaults() {
        let config = AppConfig::resolve(FileConfig::default(), CliOverrides::default()).unwrap();
        assert_eq!(config.profile, Profile::CodesTable);
        assert_eq!(config.job.input, PathBuf::from("./data/codesTable.csv"));
        assert_eq!(config.job.input_format, TableFormat::Csv);
        assert_eq!(config.job.columns.source, "CPT_Code");
        assert_eq!(config.job.columns.rename_to.as_deref(), Some("Item"));
        assert_eq!(config.classifier.taxonomy, Taxonomy::SiteOfCare);
        assert_eq!(config.classifier.fallback, FallbackLabels::default());
    }

    #[test]
    fn workbook_profile_defaults() {
        let cli = CliOverrides {
            profile: Some(Profile::Workbook),
            ..CliOverrides::default()
        };
        let config = AppConfig::resolve(FileConfig::default(), cli).unwrap();
        assert_eq!(config.job.input_format, TableFormat::Spreadsheet);
        assert_eq!(config.job.output_format, TableFormat::Spreadsheet);
        assert_eq!(config.job.columns.source, "Item");
        assert!(config.job.columns.rename_to.is_none());
        assert_eq!(config.classifier.taxonomy, Taxonomy::Surgical);
    }

    #[test]
    fn cli_flags_override_config_file() {
        let file = FileConfig {
            profile: Some(Profile::Workbook),
            input: Some("file-input.xlsx".into()),
            taxonomy: Some(Taxonomy::SiteOfCare),
            ..FileConfig::default()
        };
        let cli = CliOverrides {
            input: Some("cli-input.csv".into()),
            output: Some("out/result.csv".into()),
            ..CliOverrides::default()
        };
        let config = AppConfig::resolve(file, cli).unwrap();
        assert_eq!(config.profile, Profile::Workbook);
        assert_eq!(config.job.input, PathBuf::from("cli-input.csv"));
        assert_eq!(config.job.input_format, TableFormat::Csv);
        assert_eq!(config.job.output_format, TableFormat::Csv);
        assert_eq!(config.classifier.taxonomy, Taxonomy::SiteOfCare);
    }

    #[test]
    fn unknown_extension_needs_explicit_format() {
        let cli = CliOverrides {
            input: Some("codes.txt".into()),
            ..CliOverrides::default()
        };
        assert!(AppConfig::resolve(FileConfig::default(), cli.clone()).is_err());

        let cli = CliOverrides {
            format: Some(TableFormat::Csv),
            output: Some("codes.out".into()),
            ..cli
        };
        let config = AppConfig::resolve(FileConfig::default(), cli).unwrap();
        assert_eq!(config.job.output_format, TableFormat::Csv);
    }

    #[test]
    fn spreadsheet_output_must_be_xlsx() {
        for output in ["out/result.ods", "out/result.xls", "out/result.xlsm"] {
            let cli = CliOverrides {
                profile: Some(Profile::Workbook),
                output: Some(output.into()),
                ..CliOverrides::default()
            };
            let err = AppConfig::resolve(FileConfig::default(), cli).unwrap_err();
            assert!(err.to_string().contains(".xlsx"), "{output}: {err}");
        }

        let cli = CliOverrides {
            profile: Some(Profile::Workbook),
            output: Some("out/result.csv".into()),
            ..CliOverrides::default()
        };
        let config = AppConfig::resolve(FileConfig::default(), cli).unwrap();
        assert_eq!(config.job.output_format, TableFormat::Csv);
    }

    #[test]
    fn loads_toml_config_file() {
        let file = tempfile::Builder::new().suffix(".toml").tempfile().unwrap();
        fs::write(
            file.path(),
            r#"
profile = "workbook"
code_column = "HCPCS"
taxonomy = "site-of-care"

[labels]
unrecognized = "unrecognized-response"

[llm]
provider = "noop"
model = "config-model"
"#,
        )
        .unwrap();

        let loaded = FileConfig::load(Some(file.path())).unwrap();
        assert_eq!(loaded.profile, Some(Profile::Workbook));
        assert_eq!(loaded.labels.unrecognized, "unrecognized-response");
        assert_eq!(loaded.labels.call_failed, "Error");
        assert_eq!(loaded.llm.provider.as_deref(), Some("noop"));

        let config = AppConfig::resolve(loaded, CliOverrides::default()).unwrap();
        assert_eq!(config.job.columns.source, "HCPCS");
        assert_eq!(config.job.columns.rename_to.as_deref(), Some("Item"));
        assert_eq!(config.classifier.taxonomy, Taxonomy::SiteOfCare);
        assert_eq!(config.llm_file.model.as_deref(), Some("config-model"));
    }

    #[test]
    fn missing_config_file_is_an_error() {
        let err = FileConfig::load(Some(Path::new("/nonexistent/categorizer.toml"))).unwrap_err();
        assert!(err.to_string().contains("failed to load config file"));
    }
}
