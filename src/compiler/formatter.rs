use async_trait::async_trait;

/// 格式化失败
#[derive(Debug, Clone, PartialEq, thiserror::Error)]
pub enum FormatError {
    #[error("line {line}: unexpected `{found}`")]
    Unbalanced { line: usize, found: char },

    #[error("line {line}: `{open}` is never closed")]
    Unclosed { line: usize, open: char },

    #[error("line {line}: unterminated string literal")]
    UnterminatedString { line: usize },

    #[error("external formatter failed: {0}")]
    External(String),
}

/// Lays out generated source. Implementations may shell out to an external
/// tool, hence async.
#[async_trait]
pub trait Formatter: Send + Sync {
    async fn format(&self, code: &str) -> Result<String, FormatError>;
}

/// Built-in JavaScript layout.
///
/// Re-indents by bracket depth and normalises blank lines. It understands
/// string literals and comments well enough not to count brackets inside
/// them, which is all the emitted code needs.
#[derive(Debug, Clone)]
pub struct ScriptFormatter {
    indent_width: usize,
}

impl Default for ScriptFormatter {
    fn default() -> Self {
        Self::new(2)
    }
}

#[derive(Debug, Clone, Copy, PartialEq)]
enum Lexical {
    Code,
    Str(char),
    BlockComment,
}

struct Open {
    bracket: char,
    line: usize,
}

impl ScriptFormatter {
    pub fn new(indent_width: usize) -> Self {
        Self { indent_width }
    }

    /// Synchronous core of [`Formatter::format`].
    pub fn layout(&self, code: &str) -> Result<String, FormatError> {
        let mut stack: Vec<Open> = Vec::new();
        let mut state = Lexical::Code;
        let mut lines: Vec<String> = Vec::new();

        for (index, raw) in code.lines().enumerate() {
            let number = index + 1;
            let text = raw.trim();

            // Continuation lines of a block comment keep their text as is.
            if state == Lexical::BlockComment {
                lines.push(self.indented(depth(&stack), text));
                state = scan(text, number, state, &mut stack)?;
                continue;
            }

            if text.is_empty() {
                if lines.last().is_some_and(|last| !last.is_empty()) {
                    lines.push(String::new());
                }
                continue;
            }

            let leading = leading_closers(text);
            if let Some(found) = leading.get(stack.len()) {
                return Err(FormatError::Unbalanced { line: number, found: *found });
            }
            let level = depth(&stack[..stack.len() - leading.len()]);

            if !leading.is_empty() && lines.last().is_some_and(|last| last.is_empty()) {
                lines.pop();
            }
            lines.push(self.indented(level, text));

            state = scan(text, number, state, &mut stack)?;
            if let Lexical::Str(_) = state {
                return Err(FormatError::UnterminatedString { line: number });
            }
        }

        if let Some(open) = stack.first() {
            return Err(FormatError::Unclosed { line: open.line, open: open.bracket });
        }

        let mut out = String::with_capacity(code.len());
        let mut previous: Option<&str> = None;
        for line in &lines {
            if line.is_empty() && previous.is_some_and(opens_block) {
                continue;
            }
            out.push_str(line);
            out.push('\n');
            previous = Some(line.as_str());
        }
        while out.ends_with("\n\n") {
            out.pop();
        }
        if out.trim().is_empty() {
            return Ok(String::new());
        }
        Ok(out)
    }

    fn indented(&self, level: usize, text: &str) -> String {
        if text.is_empty() {
            return String::new();
        }
        format!("{}{}", " ".repeat(level * self.indent_width), text)
    }
}

#[async_trait]
impl Formatter for ScriptFormatter {
    async fn format(&self, code: &str) -> Result<String, FormatError> {
        self.layout(code)
    }
}

/// Indent level: brackets opened on the same line count once, so
/// `group("x", () => {` indents its body by a single level.
fn depth(stack: &[Open]) -> usize {
    let mut count = 0;
    let mut last = None;
    for open in stack {
        if last != Some(open.line) {
            count += 1;
            last = Some(open.line);
        }
    }
    count
}

/// Closing brackets at the start of a line, up to the first other character.
fn leading_closers(text: &str) -> Vec<char> {
    text.chars()
        .take_while(|c| matches!(c, '}' | ']' | ')' | ' ' | ';' | ','))
        .filter(|c| matches!(c, '}' | ']' | ')'))
        .collect()
}

fn opens_block(line: &str) -> bool {
    line.trim_end().ends_with(['{', '[', '('])
}

fn closer_of(open: char) -> char {
    match open {
        '{' => '}',
        '[' => ']',
        _ => ')',
    }
}

/// Track brackets on one line. Returns the lexical state at end of line.
fn scan(text: &str, line: usize, mut state: Lexical, stack: &mut Vec<Open>) -> Result<Lexical, FormatError> {
    let mut chars = text.chars().peekable();
    while let Some(c) = chars.next() {
        match state {
            Lexical::BlockComment => {
                if c == '*' && chars.peek() == Some(&'/') {
                    chars.next();
                    state = Lexical::Code;
                }
            }
            Lexical::Str(quote) => {
                if c == '\\' {
                    chars.next();
                } else if c == quote {
                    state = Lexical::Code;
                }
            }
            Lexical::Code => match c {
                '"' | '\'' | '`' => state = Lexical::Str(c),
                '/' if chars.peek() == Some(&'/') => break,
                '/' if chars.peek() == Some(&'*') => {
                    chars.next();
                    state = Lexical::BlockComment;
                }
                '{' | '[' | '(' => stack.push(Open { bracket: c, line }),
                '}' | ']' | ')' => match stack.pop() {
                    Some(open) if closer_of(open.bracket) == c => {}
                    _ => return Err(FormatError::Unbalanced { line, found: c }),
                },
                _ => {}
            },
        }
    }
    Ok(state)
}
