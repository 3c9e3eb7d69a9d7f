//! Classification tiers and the configurable pattern tables

use serde::{Deserialize, Serialize};

/// How much a tool call matters to system behavior
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "UPPERCASE")]
pub enum Criticality {
    /// Losing it would change behavior: configs, secrets, auth, routes
    Essential,
    /// Business logic, data models, reusable code
    Important,
    Routine,
}

fn strings(items: &[&str]) -> Vec<String> {
    items.iter().map(|s| s.to_string()).collect()
}

/// Pattern tables driving classification
///
/// These are data, not code: deployments override any list from
/// configuration and the classifier logic never hardcodes a marker.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct CriticalityRules {
    /// Path fragments marking configuration files
    pub config_path_markers: Vec<String>,
    /// Uppercase content fragments marking secrets or environment wiring
    pub secret_markers: Vec<String>,
    /// Path or content fragments marking database configuration
    pub database_markers: Vec<String>,
    /// Path or content fragments marking authentication or authorization
    pub auth_markers: Vec<String>,
    /// Path fragments marking API routes and middleware
    pub route_markers: Vec<String>,
    /// Path fragments marking build and deployment configuration
    pub build_markers: Vec<String>,
    /// Naming fragments marking business logic
    pub business_markers: Vec<String>,
    /// Naming fragments marking reusable utility code
    pub utility_markers: Vec<String>,
    /// Stateful-hook markers for significant UI components
    pub ui_state_markers: Vec<String>,
}

impl Default for CriticalityRules {
    fn default() -> Self {
        Self {
            config_path_markers: strings(&[
                "config",
                ".env",
                "tsconfig",
                "package.json",
                "cargo.toml",
                "dockerfile",
                "webpack",
                "vite.config",
                "babel",
                "makefile",
                "settings",
            ]),
            secret_markers: strings(&[
                "API_KEY",
                "SECRET",
                "TOKEN",
                "PASSWORD",
                "DATABASE_URL",
                "JWT_SECRET",
                "PRIVATE_KEY",
                "CREDENTIALS",
            ]),
            database_markers: strings(&["schema", "migration", "database", "db/"]),
            auth_markers: strings(&[
                "auth",
                "login",
                "session",
                "permission",
                "oauth",
                "jwt",
                "rbac",
            ]),
            route_markers: strings(&["route", "middleware", "endpoint", "/api/", "controller/api"]),
            build_markers: strings(&[
                "deploy",
                ".github/workflows",
                "jenkinsfile",
                "k8s",
                "helm",
                "terraform",
                "ci.yml",
                "pipeline",
            ]),
            business_markers: strings(&[
                "service",
                "controller",
                "manager",
                "handler",
                "processor",
                "validator",
                "repository",
                "gateway",
                "engine",
            ]),
            utility_markers: strings(&["util", "helper", "common", "shared", "lib/"]),
            ui_state_markers: strings(&["useState", "useEffect", "useReducer", "useContext"]),
        }
    }
}
