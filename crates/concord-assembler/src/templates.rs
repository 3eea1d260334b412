//! Instruction template registry
//!
//! Built once at startup and read-only afterwards. Built-in templates are
//! compiled into the binary; a template folder can override any of them.

use crate::error::AssemblyError;
use handlebars::{no_escape, Handlebars};
use serde::Serialize;
use std::fs;
use std::path::Path;
use tracing::info;

/// The instruction templates the message builder knows about
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum InstructionTemplate {
    /// One vs one, or several unlinked entries with no anchors
    DisconnectedEntries,
    /// One entry against a known-same group
    OneDisconnectedSeveralRemaining,
    /// Several entries against a known-same group
    SeveralDisconnectedSeveralRemaining,
    /// Pairwise benchmarking, chat prompt
    BenchmarkingChat,
    /// Pairwise benchmarking, flattened prompt
    BenchmarkingFlattened,
}

impl InstructionTemplate {
    /// Every template, in registration order
    pub const ALL: [InstructionTemplate; 5] = [
        InstructionTemplate::DisconnectedEntries,
        InstructionTemplate::OneDisconnectedSeveralRemaining,
        InstructionTemplate::SeveralDisconnectedSeveralRemaining,
        InstructionTemplate::BenchmarkingChat,
        InstructionTemplate::BenchmarkingFlattened,
    ];

    /// Registry name (file stem of the template)
    pub fn name(&self) -> &'static str {
        match self {
            InstructionTemplate::DisconnectedEntries => "disconnected_entries",
            InstructionTemplate::OneDisconnectedSeveralRemaining => {
                "one_disconnected_several_remaining"
            }
            InstructionTemplate::SeveralDisconnectedSeveralRemaining => {
                "several_disconnected_several_remaining"
            }
            InstructionTemplate::BenchmarkingChat => "benchmarking_chat",
            InstructionTemplate::BenchmarkingFlattened => "benchmarking_flattened",
        }
    }

    fn builtin_source(&self) -> &'static str {
        match self {
            InstructionTemplate::DisconnectedEntries => {
                include_str!("../templates/disconnected_entries.hbs")
            }
            InstructionTemplate::OneDisconnectedSeveralRemaining => {
                include_str!("../templates/one_disconnected_several_remaining.hbs")
            }
            InstructionTemplate::SeveralDisconnectedSeveralRemaining => {
                include_str!("../templates/several_disconnected_several_remaining.hbs")
            }
            InstructionTemplate::BenchmarkingChat => {
                include_str!("../templates/benchmarking_chat.hbs")
            }
            InstructionTemplate::BenchmarkingFlattened => {
                include_str!("../templates/benchmarking_flattened.hbs")
            }
        }
    }
}

/// Values available inside instruction templates
#[derive(Debug, Clone, Copy, Default, Serialize)]
pub struct TemplateContext {
    /// Entries under evaluation
    pub n_disconnected: usize,
    /// Known-same anchors
    pub n_remaining: usize,
}

/// Read-only set of compiled instruction templates
pub struct TemplateRegistry {
    handlebars: Handlebars<'static>,
}

impl TemplateRegistry {
    fn empty() -> Self {
        let mut handlebars = Handlebars::new();
        handlebars.register_escape_fn(no_escape);
        handlebars.set_strict_mode(true);
        Self { handlebars }
    }

    /// Registry holding only the built-in templates
    pub fn builtin() -> Result<Self, AssemblyError> {
        let mut registry = Self::empty();
        for template in InstructionTemplate::ALL {
            registry.register(template.name(), template.builtin_source())?;
        }
        Ok(registry)
    }

    /// Built-in templates overridden by every `*.hbs` file in `dir`
    ///
    /// A missing or unreadable folder is an error.
    pub fn load_dir(dir: impl AsRef<Path>) -> Result<Self, AssemblyError> {
        let dir = dir.as_ref();
        info!("Loading templates from folder: {}", dir.display());

        let mut registry = Self::builtin()?;
        for entry in fs::read_dir(dir)? {
            let path = entry?.path();
            if path.extension().and_then(|e| e.to_str()) != Some("hbs") {
                continue;
            }
            let Some(name) = path.file_stem().and_then(|s| s.to_str()) else {
                continue;
            };
            info!("Loading template: {}", name);
            let source = fs::read_to_string(&path)?;
            registry.register(name, &source)?;
        }
        Ok(registry)
    }

    fn register(&mut self, name: &str, source: &str) -> Result<(), AssemblyError> {
        self.handlebars
            .register_template_string(name, source)
            .map_err(|e| AssemblyError::Template(format!("{}: {}", name, e)))
    }

    /// True when a template with this name is registered
    pub fn contains(&self, name: &str) -> bool {
        self.handlebars.has_template(name)
    }

    /// Render `template` with `context`
    pub fn render(
        &self,
        template: InstructionTemplate,
        context: &TemplateContext,
    ) -> Result<String, AssemblyError> {
        self.handlebars
            .render(template.name(), context)
            .map(|text| text.trim().to_string())
            .map_err(|e| AssemblyError::Template(format!("{}: {}", template.name(), e)))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::TempDir;

    #[test]
    fn test_builtin_templates_render() {
        let registry = TemplateRegistry::builtin().unwrap();
        let context = TemplateContext {
            n_disconnected: 2,
            n_remaining: 3,
        };
        for template in InstructionTemplate::ALL {
            let text = registry.render(template, &context).unwrap();
            assert!(!text.is_empty(), "{}", template.name());
        }
        let text = registry
            .render(InstructionTemplate::SeveralDisconnectedSeveralRemaining, &context)
            .unwrap();
        assert!(text.contains("3 metadata entries"));
        assert!(text.contains("2 further entries"));
    }

    #[test]
    fn test_folder_overrides_builtin() {
        let dir = TempDir::new().unwrap();
        fs::write(
            dir.path().join("disconnected_entries.hbs"),
            "Compare {{n_disconnected}} entries & report.",
        )
        .unwrap();
        fs::write(dir.path().join("notes.txt"), "ignored").unwrap();

        let registry = TemplateRegistry::load_dir(dir.path()).unwrap();
        let text = registry
            .render(
                InstructionTemplate::DisconnectedEntries,
                &TemplateContext {
                    n_disconnected: 4,
                    n_remaining: 0,
                },
            )
            .unwrap();
        assert_eq!(text, "Compare 4 entries & report.");
        assert!(registry.contains("benchmarking_chat"));
        assert!(!registry.contains("notes"));
    }

    #[test]
    fn test_missing_folder_is_fatal() {
        let result = TemplateRegistry::load_dir("/nonexistent/concord/templates");
        assert!(matches!(result, Err(AssemblyError::Io(_))));
    }

    #[test]
    fn test_malformed_template_rejected() {
        let dir = TempDir::new().unwrap();
        fs::write(dir.path().join("broken.hbs"), "{{#if}}").unwrap();
        assert!(matches!(
            TemplateRegistry::load_dir(dir.path()),
            Err(AssemblyError::Template(_))
        ));
    }
}
