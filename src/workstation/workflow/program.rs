// SPDX-License-Identifier: MIT

//! Generated standalone programs

use super::error::WorkflowError;
use std::path::Path;
use std::process::Stdio;
use tokio::io::AsyncWriteExt;
use tokio::process::Command;

const HEADER: &str = "// Generated by workstation from a workflow file.
#![recursion_limit = \"256\"]
#![allow(unused_imports, unused_mut, unused_variables, unused_assignments)]
";

/// Imports, initialization and execution statements of one program
#[derive(Debug, Clone, PartialEq)]
pub struct GeneratedProgram {
    imports: Vec<String>,
    inits: Vec<String>,
    execs: Vec<String>,
    text: String,
}

/// Drop repeated imports, keeping each at its last position
pub fn dedupe_imports(imports: &[String]) -> Vec<String> {
    let mut kept: Vec<String> = Vec::with_capacity(imports.len());
    for (i, import) in imports.iter().enumerate() {
        if !imports[i + 1..].contains(import) {
            kept.push(import.clone());
        }
    }
    kept
}

impl GeneratedProgram {
    pub fn new(imports: Vec<String>, inits: Vec<String>, execs: Vec<String>) -> Self {
        let imports = dedupe_imports(&imports);
        let text = render(&imports, &inits, &execs);
        Self {
            imports,
            inits,
            execs,
            text,
        }
    }

    pub fn imports(&self) -> &[String] {
        &self.imports
    }

    pub fn inits(&self) -> &[String] {
        &self.inits
    }

    pub fn execs(&self) -> &[String] {
        &self.execs
    }

    /// Program source
    pub fn text(&self) -> &str {
        &self.text
    }

    /// Run the source through rustfmt, keeping it as is if that fails.
    ///
    /// The formatter binary is `rustfmt` unless `RUSTFMT` names another.
    pub async fn format(mut self) -> Self {
        match rustfmt(&self.text).await {
            Ok(formatted) => self.text = formatted,
            Err(e) => log::debug!("Leaving generated program unformatted: {}", e),
        }
        self
    }

    pub async fn write<P: AsRef<Path>>(&self, path: P) -> Result<(), WorkflowError> {
        tokio::fs::write(path.as_ref(), &self.text).await?;
        log::info!("Wrote generated program to {}", path.as_ref().display());
        Ok(())
    }
}

fn render(imports: &[String], inits: &[String], execs: &[String]) -> String {
    let mut out = String::from(HEADER);
    out.push('\n');
    for import in imports {
        out.push_str(import);
        out.push('\n');
    }
    out.push_str("\n#[tokio::main]\n");
    out.push_str("async fn main() -> Result<(), Box<dyn std::error::Error + Send + Sync>> {\n");
    for line in inits.iter().chain(execs) {
        out.push_str("    ");
        out.push_str(line);
        out.push('\n');
    }
    out.push_str("    Ok(())\n}\n");
    out
}

async fn rustfmt(source: &str) -> std::io::Result<String> {
    let binary = std::env::var("RUSTFMT").unwrap_or_else(|_| "rustfmt".to_string());
    let mut child = Command::new(binary)
        .args(["--edition", "2021", "--quiet"])
        .stdin(Stdio::piped())
        .stdout(Stdio::piped())
        .stderr(Stdio::piped())
        .kill_on_drop(true)
        .spawn()?;

    if let Some(mut stdin) = child.stdin.take() {
        stdin.write_all(source.as_bytes()).await?;
    }

    let output = child.wait_with_output().await?;
    if !output.status.success() {
        return Err(std::io::Error::new(
            std::io::ErrorKind::Other,
            String::from_utf8_lossy(&output.stderr).trim().to_string(),
        ));
    }
    let formatted = String::from_utf8_lossy(&output.stdout).to_string();
    if formatted.trim().is_empty() {
        return Err(std::io::Error::new(
            std::io::ErrorKind::Other,
            "formatter produced no output",
        ));
    }
    Ok(formatted)
}

#[cfg(test)]
mod tests {
    use super::*;

    fn lines(items: &[&str]) -> Vec<String> {
        items.iter().map(|s| s.to_string()).collect()
    }

    #[test]
    fn test_dedupe_keeps_last_occurrence() {
        let imports = lines(&["use a;", "use b;", "use a;", "use c;"]);
        assert_eq!(dedupe_imports(&imports), lines(&["use b;", "use a;", "use c;"]));
    }

    #[test]
    fn test_render_layout() {
        let program = GeneratedProgram::new(
            lines(&["use std::sync::Arc;", "use std::sync::Arc;"]),
            lines(&["let mut flow: Option<Msg> = None;"]),
            lines(&["flow = Some(message_1.clone());"]),
        );
        let text = program.text();
        assert_eq!(text.matches("use std::sync::Arc;").count(), 1);
        assert!(text.contains("#[tokio::main]\nasync fn main()"));
        let init = text.find("let mut flow").unwrap();
        let exec = text.find("flow = Some(message_1").unwrap();
        assert!(init < exec);
        assert!(text.ends_with("    Ok(())\n}\n"));
    }

    #[tokio::test]
    async fn test_format_falls_back_when_formatter_missing() {
        std::env::set_var("RUSTFMT", "/nonexistent/rustfmt");
        let program = GeneratedProgram::new(vec![], vec![], lines(&["flow = None;"]));
        let unformatted = program.text().to_string();
        let formatted = program.format().await;
        std::env::remove_var("RUSTFMT");
        assert_eq!(formatted.text(), unformatted);
    }

    #[tokio::test]
    async fn test_write() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("main.rs");
        let program = GeneratedProgram::new(vec![], vec![], vec![]);
        program.write(&path).await.unwrap();
        assert_eq!(std::fs::read_to_string(&path).unwrap(), program.text());
    }
}
