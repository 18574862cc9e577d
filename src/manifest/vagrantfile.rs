//! Vagrantfile rendering.

use color_eyre::eyre::WrapErr;
use color_eyre::Result;
use log::{debug, info};
use minijinja::{context, Environment};
use regex::Regex;
use std::fs;
use std::path::PathBuf;
use std::sync::LazyLock;

use super::Notifier;

/// Default template location, relative to the working directory
pub const DEFAULT_TEMPLATE_PATH: &str = "Vagrantfile.jinja";

/// Default manifest location, relative to the working directory
pub const DEFAULT_MANIFEST_PATH: &str = "Vagrantfile";

/// Template used when no template file exists on disk
const BUILTIN_TEMPLATE: &str = include_str!("../../templates/Vagrantfile.jinja");

static PLATFORM_DECLARATION: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(r"platform\(\s*(?:\w+\s*,\s*)?'(\w+)'\s*\)")
        .expect("Invalid platform declaration regex")
});

/// Platform names declared in an existing manifest, in file order
pub fn parse_declared_platforms(content: &str) -> Vec<String> {
    content
        .lines()
        .map(str::trim_start)
        .filter(|line| !line.starts_with('#'))
        .filter_map(|line| PLATFORM_DECLARATION.captures(line))
        .map(|caps| caps[1].to_string())
        .collect()
}

/// Regenerates the Vagrantfile from a minijinja template
#[derive(Debug, Clone)]
pub struct VagrantfileNotifier {
    template_path: PathBuf,
    manifest_path: PathBuf,
}

impl VagrantfileNotifier {
    pub fn new(template_path: impl Into<PathBuf>, manifest_path: impl Into<PathBuf>) -> Self {
        Self {
            template_path: template_path.into(),
            manifest_path: manifest_path.into(),
        }
    }

    fn template_source(&self) -> Result<String> {
        if self.template_path.is_file() {
            fs::read_to_string(&self.template_path).wrap_err_with(|| {
                format!("Failed to read template '{}'", self.template_path.display())
            })
        } else {
            debug!("No template at {:?}, using the built-in one", self.template_path);
            Ok(BUILTIN_TEMPLATE.to_string())
        }
    }

    /// Render the manifest for the given platforms
    pub fn render(&self, platforms: &[String]) -> Result<String> {
        let source = self.template_source()?;
        let mut env = Environment::new();
        env.add_template("Vagrantfile", &source)
            .wrap_err("Invalid Vagrantfile template")?;

        let template = env.get_template("Vagrantfile")?;
        let rendered = template
            .render(context! { platforms => platforms })
            .wrap_err("Failed to render Vagrantfile template")?;
        Ok(rendered)
    }

    /// Platforms declared in the current manifest, empty if there is none
    pub fn declared_platforms(&self) -> Result<Vec<String>> {
        if !self.manifest_path.is_file() {
            return Ok(Vec::new());
        }
        let content = fs::read_to_string(&self.manifest_path).wrap_err_with(|| {
            format!("Failed to read manifest '{}'", self.manifest_path.display())
        })?;
        Ok(parse_declared_platforms(&content))
    }
}

impl Default for VagrantfileNotifier {
    fn default() -> Self {
        Self::new(DEFAULT_TEMPLATE_PATH, DEFAULT_MANIFEST_PATH)
    }
}

impl Notifier for VagrantfileNotifier {
    fn notify(&mut self, platforms: &[String]) -> Result<()> {
        let previous = self.declared_platforms()?;
        for added in platforms.iter().filter(|name| !previous.contains(name)) {
            info!("Declaring platform '{}' in {:?}", added, self.manifest_path);
        }
        for pruned in previous.iter().filter(|name| !platforms.contains(name)) {
            info!("Pruning platform '{}' from {:?}", pruned, self.manifest_path);
        }

        let rendered = self.render(platforms)?;
        fs::write(&self.manifest_path, rendered).wrap_err_with(|| {
            format!("Failed to write manifest '{}'", self.manifest_path.display())
        })
    }
}
