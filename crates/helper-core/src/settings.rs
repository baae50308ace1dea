use serde::Deserialize;
use serde::Serialize;

pub const AVAILABLE_MODELS: &[&str] = &[
    "gpt-4o",
    "gpt-4",
    "gpt-3.5-turbo",
    "claude-3-opus",
    "claude-3-sonnet",
];

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Theme {
    #[default]
    Dark,
    Light,
}

impl Theme {
    pub fn label(self) -> &'static str {
        match self {
            Self::Dark => "dark",
            Self::Light => "light",
        }
    }

    pub fn toggle(self) -> Self {
        match self {
            Self::Dark => Self::Light,
            Self::Light => Self::Dark,
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Provider {
    OpenAi,
    Azure,
    Claude,
}

impl Provider {
    pub const ALL: [Provider; 3] = [Provider::OpenAi, Provider::Azure, Provider::Claude];

    pub fn label(self) -> &'static str {
        match self {
            Self::OpenAi => "OpenAI",
            Self::Azure => "Azure",
            Self::Claude => "Claude",
        }
    }
}

#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct ApiKeys {
    pub openai: Option<String>,
    pub azure: Option<String>,
    pub claude: Option<String>,
}

impl ApiKeys {
    pub fn get(&self, provider: Provider) -> Option<&str> {
        let key = match provider {
            Provider::OpenAi => &self.openai,
            Provider::Azure => &self.azure,
            Provider::Claude => &self.claude,
        };
        key.as_deref().filter(|key| !key.trim().is_empty())
    }

    pub fn set(&mut self, provider: Provider, key: &str) {
        let key = key.trim();
        let value = (!key.is_empty()).then(|| key.to_string());
        match provider {
            Provider::OpenAi => self.openai = value,
            Provider::Azure => self.azure = value,
            Provider::Claude => self.claude = value,
        }
    }

    /// Chat needs an OpenAI or Claude key; Azure alone is not enough.
    pub fn has_chat_provider(&self) -> bool {
        self.get(Provider::OpenAi).is_some() || self.get(Provider::Claude).is_some()
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default, rename_all = "camelCase")]
pub struct Settings {
    pub api_keys: ApiKeys,
    pub model: String,
    pub temperature: f32,
    pub theme: Theme,
    pub allow_command_execution: bool,
}

impl Default for Settings {
    fn default() -> Self {
        Self {
            api_keys: ApiKeys::default(),
            model: AVAILABLE_MODELS[0].to_string(),
            temperature: 0.7,
            theme: Theme::default(),
            allow_command_execution: false,
        }
    }
}

impl Settings {
    pub fn cycle_model(&mut self) {
        let idx = AVAILABLE_MODELS
            .iter()
            .position(|model| *model == self.model)
            .map_or(0, |idx| (idx + 1) % AVAILABLE_MODELS.len());
        self.model = AVAILABLE_MODELS[idx].to_string();
    }

    pub fn set_temperature(&mut self, value: f32) {
        self.temperature = (value * 10.0).round().clamp(0.0, 20.0) / 10.0;
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use pretty_assertions::assert_eq;

    #[test]
    fn partial_record_fills_defaults() {
        let settings: Settings =
            serde_json::from_str(r#"{"allowCommandExecution":true,"apiKeys":{"claude":"k"}}"#)
                .unwrap();
        assert!(settings.allow_command_execution);
        assert!(settings.api_keys.has_chat_provider());
        assert_eq!(settings.theme, Theme::Dark);
        assert_eq!(settings.model, AVAILABLE_MODELS[0]);
    }

    #[test]
    fn blank_and_azure_keys_do_not_enable_chat() {
        let mut keys = ApiKeys::default();
        keys.set(Provider::OpenAi, "   ");
        keys.set(Provider::Azure, "azure-key");
        assert_eq!(keys.openai, None);
        assert!(!keys.has_chat_provider());
    }

    #[test]
    fn model_cycles_and_temperature_clamps() {
        let mut settings = Settings::default();
        settings.cycle_model();
        assert_eq!(settings.model, AVAILABLE_MODELS[1]);
        settings.model = "unknown".to_string();
        settings.cycle_model();
        assert_eq!(settings.model, AVAILABLE_MODELS[0]);

        settings.set_temperature(3.7);
        assert_eq!(settings.temperature, 2.0);
        settings.set_temperature(-1.0);
        assert_eq!(settings.temperature, 0.0);
    }
}
