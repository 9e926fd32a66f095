//! Syntax checks for rendered Python source.

use std::io::Write;
use std::process::{Command, Stdio};

use log::debug;
use oapy_core::config::SyntaxCheck;
use oapy_core::services::{SourceValidator, SyntaxIssue};

/// Pick the checker for a configured `SyntaxCheck` level.
pub fn validator_for(check: SyntaxCheck) -> Option<Box<dyn SourceValidator>> {
    match check {
        SyntaxCheck::Off => None,
        SyntaxCheck::Builtin => Some(Box::new(PythonSourceCheck)),
        SyntaxCheck::Python => Some(Box::new(PythonCompileCheck::default())),
    }
}

/// In-process structural check: string literals, bracket balance and
/// default-argument ordering in `def` signatures.
#[derive(Debug, Clone, Copy, Default)]
pub struct PythonSourceCheck;

impl SourceValidator for PythonSourceCheck {
    fn validate(&self, source: &str) -> Result<(), SyntaxIssue> {
        let code = strip_literals(source)?;
        check_brackets(&code)?;
        check_signatures(&code)
    }
}

/// Replace every string literal with `""` and drop comments, keeping line
/// breaks so line numbers still match `source`.
fn strip_literals(source: &str) -> Result<String, SyntaxIssue> {
    let chars: Vec<char> = source.chars().collect();
    let mut out = String::with_capacity(source.len());
    let mut line = 1;
    let mut i = 0;

    while i < chars.len() {
        let c = chars[i];
        match c {
            '#' => {
                while i < chars.len() && chars[i] != '\n' {
                    i += 1;
                }
                continue;
            }
            '\'' | '"' => {
                let start_line = line;
                let triple = chars.get(i + 1) == Some(&c) && chars.get(i + 2) == Some(&c);
                i += if triple { 3 } else { 1 };

                let mut closed = false;
                while i < chars.len() {
                    let ch = chars[i];
                    if ch == '\\' {
                        if chars.get(i + 1) == Some(&'\n') {
                            line += 1;
                            out.push('\n');
                        }
                        i += 2;
                        continue;
                    }
                    if ch == '\n' {
                        if !triple {
                            break;
                        }
                        line += 1;
                        out.push('\n');
                    } else if ch == c
                        && (!triple
                            || (chars.get(i + 1) == Some(&c) && chars.get(i + 2) == Some(&c)))
                    {
                        i += if triple { 3 } else { 1 };
                        closed = true;
                        break;
                    }
                    i += 1;
                }

                if !closed {
                    return Err(SyntaxIssue::at_line(
                        start_line,
                        "unterminated string literal",
                    ));
                }
                out.push_str("\"\"");
                continue;
            }
            '\n' => line += 1,
            _ => {}
        }
        out.push(c);
        i += 1;
    }

    Ok(out)
}

fn check_brackets(code: &str) -> Result<(), SyntaxIssue> {
    let mut stack: Vec<(char, usize)> = Vec::new();

    for (index, text) in code.lines().enumerate() {
        let line = index + 1;
        for c in text.chars() {
            match c {
                '(' | '[' | '{' => stack.push((c, line)),
                ')' | ']' | '}' => {
                    let expected = match c {
                        ')' => '(',
                        ']' => '[',
                        _ => '{',
                    };
                    match stack.pop() {
                        Some((open, _)) if open == expected => {}
                        Some((open, opened)) => {
                            return Err(SyntaxIssue::at_line(
                                line,
                                format!("'{c}' does not match '{open}' on line {opened}"),
                            ));
                        }
                        None => {
                            return Err(SyntaxIssue::at_line(line, format!("unmatched '{c}'")));
                        }
                    }
                }
                _ => {}
            }
        }
    }

    match stack.pop() {
        Some((open, line)) => Err(SyntaxIssue::at_line(
            line,
            format!("'{open}' was never closed"),
        )),
        None => Ok(()),
    }
}

fn check_signatures(code: &str) -> Result<(), SyntaxIssue> {
    let mut search = 0;

    while let Some(found) = code[search..].find("def ") {
        let start = search + found;
        search = start + 4;

        let at_word_start = code[..start]
            .chars()
            .next_back()
            .is_none_or(|c| !(c.is_alphanumeric() || c == '_'));
        if !at_word_start {
            continue;
        }

        let Some(open) = code[search..].find('(').map(|at| search + at) else {
            break;
        };
        let name = code[search..open].trim();
        if name.is_empty() || !name.chars().all(|c| c.is_alphanumeric() || c == '_') {
            continue;
        }
        let Some(close) = matching_paren(code, open) else {
            continue;
        };

        let line = code[..start].matches('\n').count() + 1;
        check_defaults(&code[open + 1..close], line)?;
        search = close;
    }

    Ok(())
}

fn check_defaults(params: &str, line: usize) -> Result<(), SyntaxIssue> {
    let mut seen_default = false;

    for param in split_top_level(params, ',') {
        let param = param.trim();
        if param.is_empty() || param == "/" {
            continue;
        }
        // Everything after `*` or `*args` is keyword-only.
        if param.starts_with('*') {
            break;
        }

        let has_default = split_top_level(param, '=').len() > 1;
        if has_default {
            seen_default = true;
        } else if seen_default {
            let name = param.split(':').next().unwrap_or(param).trim();
            return Err(SyntaxIssue::at_line(
                line,
                format!("parameter '{name}' without a default follows parameter with a default"),
            ));
        }
    }

    Ok(())
}

fn matching_paren(code: &str, open: usize) -> Option<usize> {
    let mut depth = 0usize;
    for (offset, c) in code[open..].char_indices() {
        match c {
            '(' | '[' | '{' => depth += 1,
            ')' | ']' | '}' => {
                depth = depth.saturating_sub(1);
                if depth == 0 {
                    return Some(open + offset);
                }
            }
            _ => {}
        }
    }
    None
}

fn split_top_level(text: &str, separator: char) -> Vec<&str> {
    let mut parts = Vec::new();
    let mut depth = 0usize;
    let mut start = 0;

    for (i, c) in text.char_indices() {
        match c {
            '(' | '[' | '{' => depth += 1,
            ')' | ']' | '}' => depth = depth.saturating_sub(1),
            c if c == separator && depth == 0 => {
                parts.push(&text[start..i]);
                start = i + c.len_utf8();
            }
            _ => {}
        }
    }
    parts.push(&text[start..]);
    parts
}

/// Hands the source to a Python interpreter's `ast.parse`.
///
/// A missing interpreter is not an error; the check is simply skipped.
#[derive(Debug, Clone)]
pub struct PythonCompileCheck {
    interpreter: String,
}

const PARSE_SCRIPT: &str = "\
import ast, sys
try:
    ast.parse(sys.stdin.read())
except SyntaxError as e:
    print(f\"{e.lineno or 0}:{e.msg}\")
    sys.exit(1)
";

impl PythonCompileCheck {
    pub fn new(interpreter: impl Into<String>) -> Self {
        Self {
            interpreter: interpreter.into(),
        }
    }
}

impl Default for PythonCompileCheck {
    fn default() -> Self {
        Self::new("python3")
    }
}

impl SourceValidator for PythonCompileCheck {
    fn validate(&self, source: &str) -> Result<(), SyntaxIssue> {
        let child = Command::new(&self.interpreter)
            .args(["-c", PARSE_SCRIPT])
            .stdin(Stdio::piped())
            .stdout(Stdio::piped())
            .stderr(Stdio::null())
            .spawn();
        let mut child = match child {
            Ok(child) => child,
            Err(e) => {
                debug!("{} not available, skipping syntax check: {}", self.interpreter, e);
                return Ok(());
            }
        };

        if let Some(mut stdin) = child.stdin.take() {
            if let Err(e) = stdin.write_all(source.as_bytes()) {
                debug!("could not send source to {}: {}", self.interpreter, e);
            }
        }

        let output = match child.wait_with_output() {
            Ok(output) => output,
            Err(e) => {
                debug!("{} did not finish: {}", self.interpreter, e);
                return Ok(());
            }
        };
        if output.status.success() {
            return Ok(());
        }

        let report = String::from_utf8_lossy(&output.stdout);
        let report = report.trim();
        match report.split_once(':') {
            Some((line, message)) => match line.parse::<usize>() {
                Ok(line) if line > 0 => Err(SyntaxIssue::at_line(line, message)),
                _ => Err(SyntaxIssue::new(message)),
            },
            None => Err(SyntaxIssue::new(format!(
                "{} exited with {}",
                self.interpreter, output.status
            ))),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn check(source: &str) -> Result<(), SyntaxIssue> {
        PythonSourceCheck.validate(source)
    }

    #[test]
    fn test_valid_function() {
        let source = r#"async def async_get_pet(petId : int, api_config_override: Optional[APIConfig] = None) -> Pet:
    """Fetch (a pet"""
    headers = {"Authorization": f"Bearer { token }"}  # note: [unbalanced
    return [Pet(**item) for item in body]
"#;
        assert_eq!(check(source), Ok(()));
    }

    #[test]
    fn test_unclosed_bracket() {
        let err = check("def f(a,\n    b:\n    pass\n").unwrap_err();
        assert_eq!(err.line, Some(1));
        assert_eq!(err.message, "'(' was never closed");
    }

    #[test]
    fn test_mismatched_bracket() {
        let err = check("x = [1, 2)\n").unwrap_err();
        assert_eq!(err.to_string(), "line 1: ')' does not match '[' on line 1");
        assert_eq!(check("x = 1)\n").unwrap_err().message, "unmatched ')'");
    }

    #[test]
    fn test_unterminated_strings() {
        let err = check("x = 1\ny = 'abc\n").unwrap_err();
        assert_eq!(err.line, Some(2));
        assert_eq!(err.message, "unterminated string literal");
        assert!(check("s = \"\"\"never closed\n\n").is_err());
    }

    #[test]
    fn test_multiline_docstring_keeps_line_numbers() {
        let source = "def f():\n    \"\"\"one\n    two\n    \"\"\"\n    return (1\n";
        let err = check(source).unwrap_err();
        assert_eq!(err.line, Some(5));
    }

    #[test]
    fn test_default_ordering() {
        let err = check("def f(limit : Optional[int] = None, data : Pet, ) -> None:\n    pass\n")
            .unwrap_err();
        assert_eq!(err.line, Some(1));
        assert_eq!(
            err.message,
            "parameter 'data' without a default follows parameter with a default"
        );

        assert_eq!(check("def f(a, b: Dict[str, int] = {}, *, c):\n    pass\n"), Ok(()));
        assert_eq!(check("def f(a=1, *args, b):\n    pass\n"), Ok(()));
    }

    #[test]
    fn test_identifier_containing_def() {
        assert_eq!(check("undef (a=1, b)\n"), Ok(()));
    }

    #[test]
    fn test_missing_interpreter_is_skipped() {
        let checker = PythonCompileCheck::new("definitely-not-a-python-interpreter");
        assert_eq!(checker.validate("def f(:\n"), Ok(()));
    }

    #[test]
    fn test_interpreter_reports_errors() {
        let available = Command::new("python3").arg("--version").output().is_ok();
        if !available {
            return;
        }
        let checker = PythonCompileCheck::default();
        assert_eq!(checker.validate("def f(a):\n    return a\n"), Ok(()));
        let err = checker.validate("x = 1\ndef f(:\n").unwrap_err();
        assert_eq!(err.line, Some(2));
    }

    #[test]
    fn test_validator_for() {
        assert!(validator_for(SyntaxCheck::Off).is_none());
        assert!(validator_for(SyntaxCheck::Builtin).is_some());
        assert!(validator_for(SyntaxCheck::Python).is_some());
    }
}
