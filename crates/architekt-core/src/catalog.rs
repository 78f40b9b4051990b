//! The static component catalog: every draggable component type, its display metadata and
//! its configuration schema.

use std::collections::HashSet;
use std::sync::LazyLock;

use serde::{Deserialize, Serialize};
use thiserror::Error;

use crate::config::{ConfigError, ConfigMap, ConfigValue, ParamKind};

/// Fill colour for nodes whose type has no schema.
pub const NEUTRAL_COLOR: &str = "#ffffff";

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ConfigParameter {
    pub id: String,
    pub label: String,
    #[serde(flatten)]
    pub kind: ParamKind,
    pub default_value: ConfigValue,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub description: Option<String>,
}

impl ConfigParameter {
    pub fn check(&self, value: &ConfigValue) -> Result<(), ConfigError> {
        self.kind.check(&self.id, value)
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ComponentSchema {
    #[serde(rename = "type")]
    pub type_tag: String,
    pub label: String,
    pub description: String,
    pub color: String,
    pub config: Vec<ConfigParameter>,
}

impl ComponentSchema {
    pub fn parameter(&self, id: &str) -> Option<&ConfigParameter> {
        self.config.iter().find(|p| p.id == id)
    }

    /// Every parameter set to its default, in schema order.
    pub fn default_config(&self) -> ConfigMap {
        self.config
            .iter()
            .map(|p| (p.id.clone(), p.default_value.clone()))
            .collect()
    }

    /// Validate a whole config map against this schema. Missing keys are fine.
    pub fn check_config(&self, config: &ConfigMap) -> Result<(), ConfigError> {
        for (key, value) in config {
            let param = self
                .parameter(key)
                .ok_or_else(|| ConfigError::UnknownParameter {
                    component: self.type_tag.clone(),
                    key: key.clone(),
                })?;
            param.check(value)?;
        }
        Ok(())
    }
}

#[derive(Debug, Error)]
pub enum CatalogError {
    #[error("component type '{0}' is registered twice")]
    DuplicateType(String),

    #[error("component '{component}' declares parameter '{param}' twice")]
    DuplicateParameter { component: String, param: String },

    #[error("enum parameter '{param}' of '{component}' has no options")]
    EmptyOptions { component: String, param: String },

    #[error("default of '{component}.{param}' is invalid: {source}")]
    BadDefault {
        component: String,
        param: String,
        #[source]
        source: ConfigError,
    },
}

/// Registry of component schemas. Iteration order is registration order, which is also
/// the palette display order.
#[derive(Debug, Clone)]
pub struct Catalog {
    schemas: Vec<ComponentSchema>,
}

impl Catalog {
    pub fn new(schemas: Vec<ComponentSchema>) -> Result<Self, CatalogError> {
        let mut types = HashSet::new();
        for schema in &schemas {
            if !types.insert(schema.type_tag.as_str()) {
                return Err(CatalogError::DuplicateType(schema.type_tag.clone()));
            }
            let mut params = HashSet::new();
            for param in &schema.config {
                if !params.insert(param.id.as_str()) {
                    return Err(CatalogError::DuplicateParameter {
                        component: schema.type_tag.clone(),
                        param: param.id.clone(),
                    });
                }
                if let ParamKind::Enum { options } = &param.kind {
                    if options.is_empty() {
                        return Err(CatalogError::EmptyOptions {
                            component: schema.type_tag.clone(),
                            param: param.id.clone(),
                        });
                    }
                }
                param
                    .check(&param.default_value)
                    .map_err(|source| CatalogError::BadDefault {
                        component: schema.type_tag.clone(),
                        param: param.id.clone(),
                        source,
                    })?;
            }
        }
        Ok(Self { schemas })
    }

    /// The built-in component set.
    pub fn builtin() -> &'static Catalog {
        &BUILTIN
    }

    pub fn lookup(&self, type_tag: &str) -> Option<&ComponentSchema> {
        self.schemas.iter().find(|s| s.type_tag == type_tag)
    }

    pub fn palette(&self) -> impl Iterator<Item = &ComponentSchema> {
        self.schemas.iter()
    }

    pub fn type_tags(&self) -> impl Iterator<Item = &str> {
        self.schemas.iter().map(|s| s.type_tag.as_str())
    }

    pub fn color_for(&self, type_tag: &str) -> &str {
        self.lookup(type_tag)
            .map(|s| s.color.as_str())
            .unwrap_or(NEUTRAL_COLOR)
    }

    pub fn len(&self) -> usize {
        self.schemas.len()
    }

    pub fn is_empty(&self) -> bool {
        self.schemas.is_empty()
    }

    /// The catalog as a JSON array, the form handed to the validation service.
    pub fn to_json(&self) -> Result<String, serde_json::Error> {
        serde_json::to_string(&self.schemas)
    }
}

// --- Built-in schemas ---

fn text(id: &str, label: &str, default: &str, description: &str) -> ConfigParameter {
    ConfigParameter {
        id: id.to_string(),
        label: label.to_string(),
        kind: ParamKind::Text,
        default_value: ConfigValue::from(default),
        description: Some(description.to_string()),
    }
}

fn number(id: &str, label: &str, default: f64, description: &str) -> ConfigParameter {
    ConfigParameter {
        id: id.to_string(),
        label: label.to_string(),
        kind: ParamKind::Number,
        default_value: ConfigValue::Number(default),
        description: Some(description.to_string()),
    }
}

fn choice(
    id: &str,
    label: &str,
    default: &str,
    options: &[&str],
    description: &str,
) -> ConfigParameter {
    ConfigParameter {
        id: id.to_string(),
        label: label.to_string(),
        kind: ParamKind::Enum {
            options: options.iter().map(|o| o.to_string()).collect(),
        },
        default_value: ConfigValue::from(default),
        description: Some(description.to_string()),
    }
}

fn component(
    type_tag: &str,
    label: &str,
    description: &str,
    color: &str,
    config: Vec<ConfigParameter>,
) -> ComponentSchema {
    ComponentSchema {
        type_tag: type_tag.to_string(),
        label: label.to_string(),
        description: description.to_string(),
        color: color.to_string(),
        config,
    }
}

const TOGGLE: &[&str] = &["enabled", "disabled"];

static BUILTIN: LazyLock<Catalog> = LazyLock::new(|| Catalog {
    schemas: builtin_schemas(),
});

fn builtin_schemas() -> Vec<ComponentSchema> {
    vec![
        component(
            "load-balancer",
            "Load Balancer",
            "Distributes incoming network traffic across multiple servers.",
            "hsl(180, 40%, 80%)",
            vec![
                choice(
                    "algorithm",
                    "Algorithm",
                    "round-robin",
                    &["round-robin", "least-connections", "ip-hash"],
                    "The method used to distribute requests.",
                ),
                choice(
                    "stickySessions",
                    "Sticky Sessions",
                    "disabled",
                    TOGGLE,
                    "Binds a user's session to a specific server.",
                ),
                text(
                    "healthCheckPath",
                    "Health Check Path",
                    "/",
                    "The path to check for server health.",
                ),
            ],
        ),
        component(
            "web-server",
            "Web Server",
            "A server that handles HTTP requests from clients.",
            "hsl(210, 40%, 80%)",
            vec![
                number(
                    "replicas",
                    "Replicas",
                    2.0,
                    "Number of server instances for scalability.",
                ),
                choice(
                    "instanceType",
                    "Instance Type",
                    "t3.small",
                    &["t2.micro", "t3.small", "m5.large", "c5.large"],
                    "The compute instance size.",
                ),
                choice(
                    "autoscaling",
                    "Autoscaling",
                    "enabled",
                    TOGGLE,
                    "Automatically adjust the number of replicas.",
                ),
            ],
        ),
        component(
            "cache",
            "Cache",
            "In-memory data store for fast data retrieval.",
            "hsl(60, 40%, 80%)",
            vec![
                number("ttl", "TTL (seconds)", 60.0, "Time-to-live for cached items."),
                choice(
                    "policy",
                    "Eviction Policy",
                    "LRU",
                    &["LRU", "LFU", "FIFO"],
                    "Policy to evict items when cache is full.",
                ),
                number("size", "Cache Size (MB)", 1024.0, "The total size of the cache."),
            ],
        ),
        component(
            "database",
            "Database",
            "Persistent storage for application data.",
            "hsl(0, 40%, 80%)",
            vec![
                choice(
                    "type",
                    "DB Type",
                    "PostgreSQL",
                    &["PostgreSQL", "MySQL", "MongoDB", "DynamoDB", "Cassandra"],
                    "The database engine.",
                ),
                number(
                    "replicas",
                    "Read Replicas",
                    1.0,
                    "Number of read replicas for the database.",
                ),
                choice(
                    "sharding",
                    "Sharding",
                    "disabled",
                    TOGGLE,
                    "Distribute data across multiple databases.",
                ),
            ],
        ),
        component(
            "message-queue",
            "Message Queue",
            "Asynchronous communication between services.",
            "hsl(300, 40%, 80%)",
            vec![
                choice(
                    "type",
                    "Queue Type",
                    "RabbitMQ",
                    &["RabbitMQ", "SQS", "Kafka", "Pub/Sub"],
                    "The message queue technology.",
                ),
                number(
                    "retention",
                    "Retention (days)",
                    7.0,
                    "How long messages are retained.",
                ),
            ],
        ),
        component(
            "cdn",
            "CDN",
            "Content Delivery Network for caching static assets.",
            "hsl(240, 40%, 80%)",
            vec![
                choice(
                    "provider",
                    "Provider",
                    "Cloudflare",
                    &["Cloudflare", "Fastly", "Akamai", "CloudFront"],
                    "The CDN provider.",
                ),
                text(
                    "cachingPolicy",
                    "Caching Policy",
                    "Cache-Control: max-age=3600",
                    "Default caching headers for assets.",
                ),
            ],
        ),
        component(
            "api-gateway",
            "API Gateway",
            "Manages and routes API requests.",
            "hsl(270, 40%, 80%)",
            vec![
                choice(
                    "protocol",
                    "Protocol",
                    "REST",
                    &["REST", "GraphQL", "gRPC", "WebSocket"],
                    "The API protocol.",
                ),
                number(
                    "rateLimiting",
                    "Rate Limiting (req/s)",
                    100.0,
                    "Requests per second limit.",
                ),
            ],
        ),
        component(
            "auth-service",
            "Auth Service",
            "Handles user authentication and authorization.",
            "hsl(330, 40%, 80%)",
            vec![
                choice(
                    "provider",
                    "Auth Provider",
                    "Firebase Auth",
                    &["Firebase Auth", "Auth0", "Okta", "Keycloak"],
                    "The authentication service provider.",
                ),
                choice(
                    "sso",
                    "SSO Protocol",
                    "OAuth 2.0",
                    &["OAuth 2.0", "SAML", "OpenID"],
                    "Single Sign-On protocol.",
                ),
            ],
        ),
        component(
            "object-storage",
            "Object Storage",
            "Scalable storage for unstructured data.",
            "hsl(90, 40%, 80%)",
            vec![choice(
                "provider",
                "Storage Provider",
                "S3",
                &["S3", "Google Cloud Storage", "Azure Blob Storage"],
                "The object storage service provider.",
            )],
        ),
        component(
            "firewall",
            "Firewall",
            "Network security system that monitors and controls traffic.",
            "hsl(30, 40%, 80%)",
            vec![choice(
                "rules",
                "Default Policy",
                "deny",
                &["allow", "deny"],
                "Default action for traffic that does not match any rule.",
            )],
        ),
        component(
            "vpn-gateway",
            "VPN Gateway",
            "Provides secure access to a private network.",
            "hsl(120, 40%, 80%)",
            vec![choice(
                "type",
                "VPN Type",
                "Site-to-Site",
                &["Site-to-Site", "Client-to-Site"],
                "Type of VPN connection.",
            )],
        ),
        component(
            "client-device",
            "Client Device",
            "End-user device, such as a browser, mobile, or desktop app.",
            "hsl(200, 40%, 80%)",
            vec![choice(
                "deviceType",
                "Device Type",
                "Web Browser",
                &["Web Browser", "Mobile App", "Desktop App"],
                "The type of the client device.",
            )],
        ),
        component(
            "ci-cd-pipeline",
            "CI/CD Pipeline",
            "Automates the build, test, and deployment of applications.",
            "hsl(250, 40%, 80%)",
            vec![choice(
                "provider",
                "Provider",
                "GitHub Actions",
                &["GitHub Actions", "Jenkins", "GitLab CI", "CircleCI"],
                "The CI/CD service provider.",
            )],
        ),
        component(
            "graphql-api",
            "GraphQL API",
            "API endpoint using the GraphQL query language.",
            "hsl(320, 60%, 80%)",
            vec![choice(
                "framework",
                "Framework",
                "Apollo Server",
                &["Apollo Server", "Express GraphQL", "Hasura"],
                "The GraphQL server implementation.",
            )],
        ),
    ]
}
