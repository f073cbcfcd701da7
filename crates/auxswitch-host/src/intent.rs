use std::fmt;

/// Explicit package + class name of a service component.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct ComponentName {
    pub package: String,
    pub class: String,
}

impl ComponentName {
    pub fn new(package: impl Into<String>, class: impl Into<String>) -> Self {
        Self {
            package: package.into(),
            class: class.into(),
        }
    }
}

impl fmt::Display for ComponentName {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}/{}", self.package, self.class)
    }
}

/// Addressing for a bind, start or broadcast request.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct Intent {
    pub action: Option<String>,
    pub package: Option<String>,
    pub component: Option<ComponentName>,
    pub extras: Vec<(String, String)>,
}

impl Intent {
    /// Intent addressed by action name.
    pub fn action(action: impl Into<String>) -> Self {
        Self {
            action: Some(action.into()),
            ..Self::default()
        }
    }

    /// Intent addressed to an explicit component.
    pub fn component(component: ComponentName) -> Self {
        Self {
            package: Some(component.package.clone()),
            component: Some(component),
            ..Self::default()
        }
    }

    pub fn with_package(mut self, package: impl Into<String>) -> Self {
        self.package = Some(package.into());
        self
    }

    pub fn with_action(mut self, action: impl Into<String>) -> Self {
        self.action = Some(action.into());
        self
    }

    pub fn with_extra(mut self, key: impl Into<String>, value: impl Into<String>) -> Self {
        self.extras.push((key.into(), value.into()));
        self
    }

    /// First string extra stored under `key`.
    pub fn extra(&self, key: &str) -> Option<&str> {
        self.extras
            .iter()
            .find(|(k, _)| k == key)
            .map(|(_, v)| v.as_str())
    }
}

impl fmt::Display for Intent {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "Intent {{")?;
        if let Some(action) = &self.action {
            write!(f, " act={action}")?;
        }
        if let Some(package) = &self.package {
            write!(f, " pkg={package}")?;
        }
        if let Some(component) = &self.component {
            write!(f, " cmp={component}")?;
        }
        write!(f, " }}")
    }
}
