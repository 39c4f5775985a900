use std::collections::BTreeMap;

use serde::{Deserialize, Serialize};
use serde_json::{Map, Value};

/// Query parameters of a navigation, ordered by key so URLs serialize deterministically.
pub type QueryParams = BTreeMap<String, String>;

/// How the query parameters of the current URL combine with the ones of a navigation.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum QueryParamsHandling {
    /// Only the navigation's own parameters are kept.
    #[default]
    Replace,
    /// The current URL's parameters are kept, the navigation's overlay them.
    Merge,
    /// The current URL's parameters are kept, the navigation's are ignored.
    Preserve,
}

/// Transient payload attached to a navigation and stored on its history entry.
///
/// Never serialized into the URL, so it does not survive copying a link.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct NavigationState {
    /// Legacy return anchor used by call sites that predate return tokens.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub return_to: Option<String>,
    #[serde(flatten)]
    pub data: Map<String, Value>,
}

impl NavigationState {
    pub fn with_return_to(url: impl Into<String>) -> Self {
        Self {
            return_to: Some(url.into()),
            data: Map::new(),
        }
    }

    /// Adds an arbitrary payload entry.
    pub fn with_value(mut self, key: impl Into<String>, value: Value) -> Self {
        self.data.insert(key.into(), value);
        self
    }

    /// Legacy anchor, ignoring empty strings.
    pub fn return_to(&self) -> Option<&str> {
        self.return_to.as_deref().filter(|url| !url.is_empty())
    }
}

/// Options of a single navigation.
///
/// Every field is optional so that two sets of extras can be layered:
/// see [`NavigationExtras::merged_with`].
#[derive(Debug, Clone, Default, PartialEq)]
pub struct NavigationExtras {
    pub query_params: Option<QueryParams>,
    pub query_params_handling: Option<QueryParamsHandling>,
    pub state: Option<NavigationState>,
    pub replace_url: Option<bool>,
    /// Base path for relative commands.
    pub relative_to: Option<String>,
}

impl NavigationExtras {
    /// Extras that overwrite the current history entry instead of pushing a new one.
    pub fn replace() -> Self {
        Self {
            replace_url: Some(true),
            ..Self::default()
        }
    }

    pub fn with_query_param(mut self, key: impl Into<String>, value: impl Into<String>) -> Self {
        self.query_params
            .get_or_insert_with(QueryParams::new)
            .insert(key.into(), value.into());
        self
    }

    pub fn with_handling(mut self, handling: QueryParamsHandling) -> Self {
        self.query_params_handling = Some(handling);
        self
    }

    pub fn with_state(mut self, state: NavigationState) -> Self {
        self.state = Some(state);
        self
    }

    pub fn relative_to(mut self, path: impl Into<String>) -> Self {
        self.relative_to = Some(path.into());
        self
    }

    pub fn is_replace(&self) -> bool {
        self.replace_url.unwrap_or(false)
    }

    /// Layers `overrides` on top of `self`: every field set in `overrides` wins.
    pub fn merged_with(&self, overrides: &NavigationExtras) -> NavigationExtras {
        NavigationExtras {
            query_params: overrides
                .query_params
                .clone()
                .or_else(|| self.query_params.clone()),
            query_params_handling: overrides.query_params_handling.or(self.query_params_handling),
            state: overrides.state.clone().or_else(|| self.state.clone()),
            replace_url: overrides.replace_url.or(self.replace_url),
            relative_to: overrides
                .relative_to
                .clone()
                .or_else(|| self.relative_to.clone()),
        }
    }

    /// Adds `key=token` to the query parameters, keeping the ones already present.
    ///
    /// Handling defaults to [`QueryParamsHandling::Merge`] unless the caller chose one.
    pub fn with_token(&self, key: &str, token: &str) -> NavigationExtras {
        let mut query = self.query_params.clone().unwrap_or_default();
        query.insert(key.to_string(), token.to_string());
        NavigationExtras {
            query_params: Some(query),
            query_params_handling: Some(
                self.query_params_handling
                    .unwrap_or(QueryParamsHandling::Merge),
            ),
            ..self.clone()
        }
    }
}

/// Where a navigation goes.
#[derive(Debug, Clone, PartialEq)]
pub enum NavigationTarget {
    /// An absolute URL such as `/data-processors/42?tab=2`.
    Url(String),
    /// Router path segments such as `["view-data-processing-activity", "7"]`.
    Commands(Vec<String>),
    /// Commands carrying their own extras. Caller extras win on conflict.
    Wrapped {
        commands: Vec<String>,
        extras: NavigationExtras,
    },
}

impl NavigationTarget {
    pub fn url(url: impl Into<String>) -> Self {
        NavigationTarget::Url(url.into())
    }

    pub fn commands<I, S>(commands: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: ToString,
    {
        NavigationTarget::Commands(commands.into_iter().map(|c| c.to_string()).collect())
    }

    pub fn wrapped<I, S>(commands: I, extras: NavigationExtras) -> Self
    where
        I: IntoIterator<Item = S>,
        S: ToString,
    {
        NavigationTarget::Wrapped {
            commands: commands.into_iter().map(|c| c.to_string()).collect(),
            extras,
        }
    }

    /// The application root, `['/']`.
    pub fn root() -> Self {
        NavigationTarget::commands(["/"])
    }
}

impl From<&str> for NavigationTarget {
    fn from(url: &str) -> Self {
        NavigationTarget::Url(url.to_string())
    }
}

impl From<String> for NavigationTarget {
    fn from(url: String) -> Self {
        NavigationTarget::Url(url)
    }
}

impl<const N: usize> From<[&str; N]> for NavigationTarget {
    fn from(commands: [&str; N]) -> Self {
        NavigationTarget::commands(commands)
    }
}

impl From<Vec<String>> for NavigationTarget {
    fn from(commands: Vec<String>) -> Self {
        NavigationTarget::Commands(commands)
    }
}

/// A target after normalization: exactly one router call.
#[derive(Debug, Clone, PartialEq)]
pub enum NavigationRequest {
    ByUrl {
        url: String,
        extras: NavigationExtras,
    },
    ByCommands {
        commands: Vec<String>,
        extras: NavigationExtras,
    },
}
