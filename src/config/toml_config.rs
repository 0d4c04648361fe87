use crate::adapters::memory::{demo_circuits, InMemoryCircuitRepository, MatchKey};
use crate::core::validator::validate;
use crate::core::workflow::WorkflowSettings;
use crate::domain::model::CircuitRecord;
use crate::utils::error::{PortalError, Result};
use crate::utils::validation::{validate_non_empty_string, validate_positive_number, Validate};
use serde::{Deserialize, Serialize};
use std::collections::HashSet;
use std::path::Path;
use std::time::Duration;

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct PortalConfig {
    pub portal: PortalSection,
    pub workflow: Option<WorkflowConfig>,
    pub logging: Option<LoggingConfig>,
    #[serde(default)]
    pub circuits: Vec<CircuitRecord>,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct PortalSection {
    pub name: String,
    pub description: Option<String>,
}

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct WorkflowConfig {
    pub repository_timeout_ms: Option<u64>,
    pub simulated_latency_ms: Option<u64>,
    pub match_key: Option<MatchKey>,
}

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct LoggingConfig {
    pub verbose: Option<bool>,
    pub json: Option<bool>,
}

impl PortalConfig {
    /// 未指定設定檔時使用的內建示範設定
    pub fn demo() -> Self {
        Self {
            portal: PortalSection {
                name: "Network Management Portal".to_string(),
                description: Some("Built-in demo circuits".to_string()),
            },
            workflow: None,
            logging: None,
            circuits: demo_circuits(),
        }
    }

    /// 從 TOML 檔案載入配置
    pub fn from_file<P: AsRef<Path>>(path: P) -> Result<Self> {
        let content = std::fs::read_to_string(&path)?;
        Self::from_toml_str(&content)
    }

    /// 從 TOML 字串解析配置
    pub fn from_toml_str(content: &str) -> Result<Self> {
        let processed_content = Self::substitute_env_vars(content);
        Ok(toml::from_str(&processed_content)?)
    }

    /// 替換環境變數 (例如 ${PORTAL_NAME})；未設定的變數保留原樣
    fn substitute_env_vars(content: &str) -> String {
        use regex::Regex;
        let re = Regex::new(r"\$\{([^}]+)\}").expect("static regex");

        re.replace_all(content, |caps: &regex::Captures| {
            let var_name = &caps[1];
            std::env::var(var_name).unwrap_or_else(|_| format!("${{{}}}", var_name))
        })
        .to_string()
    }

    /// 驗證配置的合理性
    pub fn validate_config(&self) -> Result<()> {
        validate_non_empty_string("portal.name", &self.portal.name)?;

        if let Some(workflow) = &self.workflow {
            if let Some(timeout) = workflow.repository_timeout_ms {
                validate_positive_number("workflow.repository_timeout_ms", timeout, 1)?;
            }
            if let Some(latency) = workflow.simulated_latency_ms {
                validate_positive_number("workflow.simulated_latency_ms", latency, 1)?;
            }
        }

        // 示範資料也必須通過編輯時的驗證規則
        let mut seen = HashSet::new();
        for (index, circuit) in self.circuits.iter().enumerate() {
            let field = format!("circuits[{}].service_number", index);
            validate_non_empty_string(&field, &circuit.service_number)?;
            if !seen.insert(circuit.service_number.trim().to_lowercase()) {
                return Err(PortalError::ConfigValidationError {
                    field,
                    message: format!("duplicate service number {}", circuit.service_number),
                });
            }

            let errors = validate(circuit, None);
            let first = errors.iter().next();
            if let Some((key, message)) = first {
                return Err(PortalError::ConfigValidationError {
                    field: format!("circuits[{}].{}", index, key),
                    message: message.to_string(),
                });
            }
        }

        Ok(())
    }

    pub fn workflow_settings(&self) -> WorkflowSettings {
        WorkflowSettings {
            repository_timeout: self
                .workflow
                .as_ref()
                .and_then(|w| w.repository_timeout_ms)
                .map(Duration::from_millis),
        }
    }

    /// 以設定中的電路建立記憶體 Repository
    pub fn build_repository(&self) -> InMemoryCircuitRepository {
        let workflow = self.workflow.clone().unwrap_or_default();
        let mut repository = InMemoryCircuitRepository::new(self.circuits.clone())
            .with_match_key(workflow.match_key.unwrap_or_default());
        if let Some(latency) = workflow.simulated_latency_ms {
            repository = repository.with_latency(Duration::from_millis(latency));
        }
        repository
    }

    pub fn verbose(&self) -> bool {
        self.logging.as_ref().and_then(|l| l.verbose).unwrap_or(false)
    }

    pub fn json_logs(&self) -> bool {
        self.logging.as_ref().and_then(|l| l.json).unwrap_or(false)
    }
}

impl Validate for PortalConfig {
    fn validate(&self) -> Result<()> {
        self.validate_config()
    }
}
