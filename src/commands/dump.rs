//! Dump command implementation.

use crate::errors::Result;
use crate::interface::{build_project, Context};
use crate::model::root_label;

/// Options for the dump command.
#[derive(Debug, Clone, Default)]
pub struct DumpOptions {
    /// Print the registry as JSON.
    pub json: bool,
}

/// Executes the dump command.
pub fn dump(ctx: &Context, options: DumpOptions) -> Result<()> {
    let project = build_project(ctx)?;
    for line in render(&project.registry, options)? {
        println!("{}", line);
    }
    Ok(())
}

fn render(registry: &crate::model::Registry, options: DumpOptions) -> Result<Vec<String>> {
    if options.json {
        return Ok(vec![registry.to_json()?]);
    }

    let mut lines = registry.pretty_dump();
    lines.push("Roots:".to_string());
    for root in registry.tangle_roots() {
        let targets = registry.file_targets(root)?;
        lines.push(format!(
            "  {}: {} blocks, {} files",
            root_label(root),
            registry.blocks_by_root(root).len(),
            targets.len()
        ));
        for target in targets {
            lines.push(format!("    {}", target.path));
        }
    }
    Ok(lines)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::model::{Registry, RegistrationMode};
    use crate::test_utils::register;
    use pretty_assertions::assert_eq;

    fn sample() -> Registry {
        let mut reg = Registry::new();
        register(&mut reg, "file: main.c", None, &["{{Body}}"], RegistrationMode::New);
        register(&mut reg, "Body", None, &["return 0;"], RegistrationMode::New);
        register(&mut reg, "Body", Some("step1"), &["return 1;"], RegistrationMode::Replace);
        reg
    }

    #[test]
    fn test_render_roots() {
        let lines = render(&sample(), DumpOptions::default()).unwrap();
        let roots = lines.iter().position(|l| l == "Roots:").unwrap();
        assert_eq!(
            lines[roots..].to_vec(),
            vec![
                "Roots:",
                "  the default root: 2 blocks, 1 files",
                "    main.c",
                "  root 'step1': 1 blocks, 1 files",
                "    main.c",
            ]
        );
    }

    #[test]
    fn test_render_json_round_trips() {
        let reg = sample();
        let lines = render(&reg, DumpOptions { json: true }).unwrap();
        assert_eq!(lines.len(), 1);
        let restored = Registry::from_json(&lines[0]).unwrap();
        assert_eq!(restored.len(), reg.len());
    }
}
