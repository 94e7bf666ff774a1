//! Colored output helpers for CLI
//!
//! Provides consistent, colored terminal output for the juris CLI.

use owo_colors::OwoColorize;

use crate::research::{Round, SourceCategory, SourceRecord, StopReason};

/// Output style configuration
pub struct Output {
    /// Whether to use colored output
    pub colored: bool,
}

impl Default for Output {
    fn default() -> Self {
        Self::new()
    }
}

impl Output {
    /// Create a new output helper with colors enabled
    pub fn new() -> Self {
        Self { colored: true }
    }

    /// Create a new output helper with colors disabled
    pub fn no_color() -> Self {
        Self { colored: false }
    }

    /// Print the juris banner
    pub fn banner(&self) {
        if self.colored {
            println!(
                r#"
   {}
   {}
   {}
   {}
"#,
                "     _            _     ".bright_yellow().bold(),
                "    (_)_  _ _ _ _(_)___ ".yellow().bold(),
                "    | | || | '_| (_-<_-<".yellow().bold(),
                "   _/ |\\_,_|_| |_/__/   ".bright_red().bold(),
            );
            println!(
                "   {} {}\n",
                "Autonomous legal research".bright_white().bold(),
                format!("v{}", env!("CARGO_PKG_VERSION")).dimmed()
            );
        } else {
            println!(
                r#"
     _            _
    (_)_  _ _ _ _(_)___
    | | || | '_| (_-<_-<
   _/ |\_,_|_| |_/__/

   Autonomous legal research v{}
"#,
                env!("CARGO_PKG_VERSION")
            );
        }
    }

    /// Print a success message with a checkmark
    pub fn success(&self, message: &str) {
        if self.colored {
            println!("  {} {}", "✓".green().bold(), message.green());
        } else {
            println!("  [OK] {}", message);
        }
    }

    /// Print an info message
    pub fn info(&self, message: &str) {
        if self.colored {
            println!("  {} {}", "•".blue(), message);
        } else {
            println!("  [INFO] {}", message);
        }
    }

    /// Print a warning message
    pub fn warning(&self, message: &str) {
        if self.colored {
            println!("  {} {}", "⚠".yellow().bold(), message.yellow());
        } else {
            println!("  [WARN] {}", message);
        }
    }

    /// Print an error message
    pub fn error(&self, message: &str) {
        if self.colored {
            eprintln!("  {} {}", "✗".red().bold(), message.red());
        } else {
            eprintln!("  [ERROR] {}", message);
        }
    }

    /// Print a file creation message
    pub fn created(&self, file_type: &str, path: &str) {
        if self.colored {
            println!(
                "  {} {} {}",
                "✓".green().bold(),
                file_type.dimmed(),
                path.bright_white()
            );
        } else {
            println!("  [CREATED] {} {}", file_type, path);
        }
    }

    /// Print a header for a section
    pub fn header(&self, title: &str) {
        if self.colored {
            println!("\n  {}", title.bright_white().bold().underline());
        } else {
            println!("\n  === {} ===", title);
        }
    }

    /// Print a subheader
    pub fn subheader(&self, title: &str) {
        if self.colored {
            println!("\n  {}", title.cyan().bold());
        } else {
            println!("\n  --- {} ---", title);
        }
    }

    /// Print a key-value pair
    pub fn kv(&self, key: &str, value: &str) {
        if self.colored {
            println!("    {}: {}", key.dimmed(), value.bright_white());
        } else {
            println!("    {}: {}", key, value);
        }
    }

    /// Print a list item
    pub fn list_item(&self, item: &str) {
        if self.colored {
            println!("    {} {}", "•".blue(), item);
        } else {
            println!("    - {}", item);
        }
    }

    /// Print a hint/tip message
    pub fn hint(&self, message: &str) {
        if self.colored {
            println!("\n  {} {}", "💡".dimmed(), message.dimmed().italic());
        } else {
            println!("\n  [TIP] {}", message);
        }
    }

    /// Print a command suggestion
    pub fn command(&self, cmd: &str) {
        if self.colored {
            println!("     {}", format!("$ {}", cmd).bright_cyan());
        } else {
            println!("     $ {}", cmd);
        }
    }

    /// Print completion message
    pub fn complete(&self, message: &str) {
        if self.colored {
            println!("\n  {} {}", "🚀".green(), message.bright_green().bold());
        } else {
            println!("\n  [DONE] {}", message);
        }
    }

    /// One line per round: queries, results, score and verdict
    pub fn round(&self, round: &Round) {
        let decision = &round.decision;
        let verdict = if decision.should_continue { "continue" } else { "stop" };
        let line = format!(
            "round {}: {} queries, {} results, {} failed, overall {:.1}, confidence {:.2}, {}",
            round.round_number,
            round.queries.len(),
            round.results.len(),
            round.failed_queries.len(),
            decision.overall(),
            decision.confidence,
            verdict
        );
        if self.colored {
            let marker = if decision.overall() >= 7.0 {
                "●".green().to_string()
            } else if decision.overall() >= 5.0 {
                "●".yellow().to_string()
            } else {
                "●".red().to_string()
            };
            println!("  {} {}", marker, line);
        } else {
            println!("  [ROUND] {}", line);
        }
        for gap in &decision.evidence_gaps {
            self.list_item(&format!("gap: {}", gap));
        }
    }

    /// A source with its category and quality
    pub fn source(&self, index: usize, source: &SourceRecord) {
        let label = format!("[{}]", source.category);
        if self.colored {
            let label = match source.category {
                SourceCategory::Official => label.green().bold().to_string(),
                SourceCategory::Academic => label.cyan().to_string(),
                SourceCategory::News => label.yellow().to_string(),
                SourceCategory::General => label.dimmed().to_string(),
            };
            println!(
                "  {:>2}. {} {} {}",
                index,
                label,
                source.title.bright_white(),
                format!("q{:.1}", source.quality).dimmed()
            );
            println!("      {}", source.url.blue().underline());
        } else {
            println!("  {:>2}. {} {} q{:.1}", index, label, source.title, source.quality);
            println!("      {}", source.url);
        }
    }

    /// Why the session stopped
    pub fn stop_reason(&self, reason: StopReason, success: bool) {
        let message = format!("stopped: {}", reason);
        if success {
            self.success(&message);
        } else {
            self.error(&message);
        }
    }

    /// Print newline
    pub fn newline(&self) {
        println!();
    }
}
