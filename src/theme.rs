use crate::model::ExecutionId;

/// Token in theme CSS standing for the slide's root element.
pub const SLIDE_ID_PLACEHOLDER: &str = "#SLIDE_ID";

/// Theme CSS scoped to one activation. The placeholder is substituted once,
/// when the theme is composed.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ScopedTheme {
    execution_id: ExecutionId,
    css: String,
}

impl ScopedTheme {
    /// `None` when there is no CSS to apply.
    pub fn compose(css: Option<&str>, execution_id: &ExecutionId) -> Option<Self> {
        let css = css.filter(|c| !c.trim().is_empty())?;
        Some(Self {
            execution_id: execution_id.clone(),
            css: css.replace(SLIDE_ID_PLACEHOLDER, &format!("#{}", execution_id)),
        })
    }

    pub fn execution_id(&self) -> &ExecutionId {
        &self.execution_id
    }

    pub fn css(&self) -> &str {
        &self.css
    }
}
