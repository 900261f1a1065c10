//! ROBOT command lines.

use std::path::Path;

use serde::{Deserialize, Serialize};

use ontoguide_core::{ExtractionRequest, InvocationShape};

/// A fully built ROBOT invocation.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct RobotCommand {
    /// Short label used in logs.
    pub name: String,

    /// Command to execute (first element is the executable).
    pub command: Vec<String>,

    /// Per-invocation timeout; 0 disables it.
    pub timeout_secs: u64,
}

fn arg(p: &Path) -> String {
    p.to_string_lossy().into_owned()
}

impl RobotCommand {
    /// `robot extract` for `request`.
    ///
    /// `term_file` is required for [`InvocationShape::TermFile`] and ignored
    /// for [`InvocationShape::IndividualTerms`], which repeats `--term`.
    pub fn extract(
        bin: &str,
        request: &ExtractionRequest,
        term_file: Option<&Path>,
        timeout_secs: u64,
    ) -> Self {
        let mut command = vec![
            bin.to_string(),
            "extract".to_string(),
            "--input".to_string(),
            arg(&request.input),
            "--method".to_string(),
            request.method.token().to_string(),
        ];

        match (request.shape, term_file) {
            (InvocationShape::TermFile, Some(file)) => {
                command.push("--term-file".to_string());
                command.push(arg(file));
            }
            _ => {
                for iri in &request.identifiers {
                    command.push("--term".to_string());
                    command.push(iri.clone());
                }
            }
        }

        command.extend([
            "--force".to_string(),
            "true".to_string(),
            "--output".to_string(),
            arg(&request.output),
        ]);

        Self {
            name: format!("extract:{}", request.method),
            command,
            timeout_secs,
        }
    }

    /// `robot query` writing SPARQL JSON results to `result_file`.
    pub fn query(
        bin: &str,
        input: &Path,
        query_file: &Path,
        result_file: &Path,
        timeout_secs: u64,
    ) -> Self {
        Self {
            name: "query".to_string(),
            command: vec![
                bin.to_string(),
                "query".to_string(),
                "--input".to_string(),
                arg(input),
                "--query".to_string(),
                arg(query_file),
                arg(result_file),
            ],
            timeout_secs,
        }
    }

    /// Command line for log output.
    pub fn display(&self) -> String {
        self.command.join(" ")
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use ontoguide_core::ExtractionMethod;
    use std::path::PathBuf;
    use uuid::Uuid;

    fn request(shape: InvocationShape) -> ExtractionRequest {
        ExtractionRequest {
            input: PathBuf::from("pizza.owl"),
            method: ExtractionMethod::Top,
            shape,
            identifiers: vec![
                "http://example.org/A".to_string(),
                "http://example.org/B".to_string(),
            ],
            output: PathBuf::from("out/pizza_AN_module.owl"),
            scratch_dir: PathBuf::from("/tmp"),
            invocation_id: Uuid::nil(),
        }
    }

    #[test]
    fn test_term_file_command() {
        let cmd = RobotCommand::extract(
            "robot",
            &request(InvocationShape::TermFile),
            Some(Path::new("/tmp/terms.txt")),
            60,
        );
        assert_eq!(
            cmd.display(),
            "robot extract --input pizza.owl --method TOP --term-file /tmp/terms.txt \
             --force true --output out/pizza_AN_module.owl"
        );
        assert_eq!(cmd.name, "extract:TOP");
    }

    #[test]
    fn test_individual_terms_command() {
        let cmd = RobotCommand::extract("robot", &request(InvocationShape::IndividualTerms), None, 60);
        let terms: Vec<&String> = cmd
            .command
            .iter()
            .zip(cmd.command.iter().skip(1))
            .filter(|(flag, _)| *flag == "--term")
            .map(|(_, value)| value)
            .collect();
        assert_eq!(terms.len(), 2);
        assert!(!cmd.command.contains(&"--term-file".to_string()));
        assert_eq!(cmd.command.last().unwrap(), "out/pizza_AN_module.owl");
    }

    #[test]
    fn test_query_command() {
        let cmd = RobotCommand::query(
            "/opt/robot",
            Path::new("pizza.owl"),
            Path::new("q.sparql"),
            Path::new("r.json"),
            30,
        );
        assert_eq!(
            cmd.command,
            vec!["/opt/robot", "query", "--input", "pizza.owl", "--query", "q.sparql", "r.json"]
        );
    }
}
