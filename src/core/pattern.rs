//! Conversion patterns for log records
//!
//! A pattern mixes literal text with `%` directives and is compiled once into
//! a token list; rendering an event walks the tokens without re-parsing.
//!
//! | Directive      | Renders                                              |
//! |----------------|------------------------------------------------------|
//! | `%p`           | level name                                           |
//! | `%c`, `%c{n}`  | logger name (`root` for the root), last `n` parts    |
//! | `%C`           | module path of the call site                         |
//! | `%M`           | enclosing function of the call site                  |
//! | `%F`           | source file name                                     |
//! | `%L`           | source line                                          |
//! | `%l`           | `file(line)`                                         |
//! | `%m`           | message                                              |
//! | `%n`           | newline                                              |
//! | `%X`           | every MDC entry as `{{k,v}{k2,v2}}`, `{}` when empty |
//! | `%X{key}`      | one MDC value, empty when absent                     |
//! | `%d`, `%d{f}`  | timestamp, see [`TimestampFormat::from_option`]      |
//! | `%r`           | milliseconds since process start                     |
//! | `%t`           | thread name, or thread id for unnamed threads        |
//! | `%x`           | nested diagnostic context, `null` when empty         |
//! | `%P`           | process id                                           |
//! | `%%`           | a literal `%`                                        |
//!
//! Any directive may carry a format modifier between `%` and the directive
//! character: `-` left-justifies, a number sets the minimum width, and `.n`
//! sets a maximum width that keeps the rightmost `n` characters.
//!
//! Unknown directive characters are copied to the output unchanged, together
//! with their `%` and modifier.

use super::error::{LoggerError, Result};
use super::log_event::LogEvent;
use super::ndc::EMPTY_NDC;
use super::timestamp::TimestampFormat;
use std::borrow::Cow;
use std::fmt;
use std::fmt::Write;

/// How the root logger's empty name is shown by `%c`
pub const ROOT_LOGGER_DISPLAY_NAME: &str = "root";

const MISSING_LOCATION: &str = "?";

/// Largest minimum or maximum width a format modifier may request
pub const MAX_FIELD_WIDTH: usize = u16::MAX as usize;

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
struct FormatModifier {
    left_justify: bool,
    min_width: Option<usize>,
    max_width: Option<usize>,
}

impl FormatModifier {
    fn is_identity(&self) -> bool {
        self.min_width.is_none() && self.max_width.is_none()
    }

    fn apply(&self, value: &str, out: &mut String) {
        if self.is_identity() {
            out.push_str(value);
            return;
        }

        let char_count = value.chars().count();
        let value = match self.max_width {
            Some(max) if char_count > max => {
                let skip = char_count - max;
                let start = value.char_indices().nth(skip).map_or(value.len(), |(i, _)| i);
                &value[start..]
            }
            _ => value,
        };

        let len = value.chars().count();
        let fill = self.min_width.unwrap_or(0).saturating_sub(len);
        if self.left_justify {
            out.push_str(value);
            out.extend(std::iter::repeat(' ').take(fill));
        } else {
            out.extend(std::iter::repeat(' ').take(fill));
            out.push_str(value);
        }
    }
}

#[derive(Debug, Clone, PartialEq)]
enum Directive {
    Level,
    LoggerName { components: Option<usize> },
    Module,
    Function,
    File,
    Line,
    Location,
    Message,
    NewLine,
    MdcDump,
    MdcValue(String),
    Date(TimestampFormat),
    Relative,
    Thread,
    NestedContext,
    ProcessId,
}

#[derive(Debug, Clone, PartialEq)]
enum Token {
    Literal(String),
    Directive {
        directive: Directive,
        modifier: FormatModifier,
    },
}

/// A compiled conversion pattern
#[derive(Debug, Clone, PartialEq)]
pub struct PatternLayout {
    source: String,
    tokens: Vec<Token>,
}

impl PatternLayout {
    /// Compile `pattern`
    ///
    /// Compile errors are a `{` option that is never closed, an invalid
    /// option value for `%c` or `%d`, or a width above [`MAX_FIELD_WIDTH`].
    pub fn compile(pattern: &str) -> Result<Self> {
        let mut tokens = Vec::new();
        let mut literal = String::new();
        let mut chars = pattern.char_indices().peekable();

        while let Some((start, c)) = chars.next() {
            if c != '%' {
                literal.push(c);
                continue;
            }

            let mut modifier = FormatModifier::default();
            if let Some((_, '-')) = chars.peek() {
                modifier.left_justify = true;
                chars.next();
            }
            modifier.min_width = read_number(&mut chars, pattern)?;
            if let Some((_, '.')) = chars.peek() {
                chars.next();
                modifier.max_width = Some(read_number(&mut chars, pattern)?.unwrap_or(0));
            }

            let Some((_, conversion)) = chars.next() else {
                // Dangling `%` or modifier at the end is plain text
                literal.push_str(&pattern[start..]);
                break;
            };

            let option = if matches!(conversion, 'c' | 'd' | 'X')
                && matches!(chars.peek(), Some((_, '{')))
            {
                chars.next();
                let mut option = String::new();
                let mut closed = false;
                for (_, ch) in chars.by_ref() {
                    if ch == '}' {
                        closed = true;
                        break;
                    }
                    option.push(ch);
                }
                if !closed {
                    return Err(LoggerError::pattern(
                        pattern,
                        format!("unterminated '{{' after %{}", conversion),
                    ));
                }
                Some(option)
            } else {
                None
            };

            let directive = match conversion {
                '%' => {
                    literal.push('%');
                    continue;
                }
                'p' => Directive::Level,
                'c' => Directive::LoggerName {
                    components: option
                        .as_deref()
                        .map(|n| {
                            n.trim().parse::<usize>().map_err(|_| {
                                LoggerError::pattern(
                                    pattern,
                                    format!("%c option must be a number, got '{}'", n),
                                )
                            })
                        })
                        .transpose()?,
                },
                'C' => Directive::Module,
                'M' => Directive::Function,
                'F' => Directive::File,
                'L' => Directive::Line,
                'l' => Directive::Location,
                'm' => Directive::Message,
                'n' => Directive::NewLine,
                'X' => match option {
                    Some(key) => Directive::MdcValue(key),
                    None => Directive::MdcDump,
                },
                'd' => Directive::Date(TimestampFormat::from_option(
                    option.as_deref().unwrap_or(""),
                )?),
                'r' => Directive::Relative,
                't' => Directive::Thread,
                'x' => Directive::NestedContext,
                'P' => Directive::ProcessId,
                _ => {
                    let end = chars.peek().map_or(pattern.len(), |(i, _)| *i);
                    literal.push_str(&pattern[start..end]);
                    continue;
                }
            };

            if !literal.is_empty() {
                tokens.push(Token::Literal(std::mem::take(&mut literal)));
            }
            tokens.push(Token::Directive {
                directive,
                modifier,
            });
        }

        if !literal.is_empty() {
            tokens.push(Token::Literal(literal));
        }

        Ok(Self {
            source: pattern.to_string(),
            tokens,
        })
    }

    /// The pattern this layout was compiled from
    pub fn pattern(&self) -> &str {
        &self.source
    }

    /// Render `event` into a line
    pub fn format(&self, event: &LogEvent) -> String {
        let mut out = String::with_capacity(self.source.len() + event.message.len() + 32);
        for token in &self.tokens {
            match token {
                Token::Literal(text) => out.push_str(text),
                Token::Directive {
                    directive,
                    modifier,
                } => {
                    let value = render_directive(directive, event);
                    modifier.apply(&value, &mut out);
                }
            }
        }
        out
    }
}

impl fmt::Display for PatternLayout {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.source)
    }
}

fn read_number(
    chars: &mut std::iter::Peekable<std::str::CharIndices<'_>>,
    pattern: &str,
) -> Result<Option<usize>> {
    let mut value: Option<usize> = None;
    while let Some(digit) = chars.peek().and_then(|(_, c)| c.to_digit(10)) {
        chars.next();
        value = Some(value.unwrap_or(0).saturating_mul(10).saturating_add(digit as usize));
    }
    match value {
        Some(width) if width > MAX_FIELD_WIDTH => Err(LoggerError::pattern(
            pattern,
            format!("field width exceeds {}", MAX_FIELD_WIDTH),
        )),
        _ => Ok(value),
    }
}

fn logger_display_name(name: &str, components: Option<usize>) -> &str {
    if name.is_empty() {
        return ROOT_LOGGER_DISPLAY_NAME;
    }
    match components {
        Some(n) if n > 0 => {
            let mut dots = name.rmatch_indices('.').skip(n - 1);
            match dots.next() {
                Some((index, _)) => &name[index + 1..],
                None => name,
            }
        }
        _ => name,
    }
}

fn render_directive<'a>(directive: &'a Directive, event: &'a LogEvent) -> Cow<'a, str> {
    let location = &event.location;
    match directive {
        Directive::Level => Cow::Borrowed(event.level.to_str()),
        Directive::LoggerName { components } => {
            Cow::Borrowed(logger_display_name(&event.logger_name, *components))
        }
        Directive::Module => Cow::Borrowed(location.module_path.unwrap_or("")),
        Directive::Function => Cow::Borrowed(location.function_name().unwrap_or("")),
        Directive::File => Cow::Borrowed(location.file_name().unwrap_or(MISSING_LOCATION)),
        Directive::Line => match location.line {
            Some(line) => Cow::Owned(line.to_string()),
            None => Cow::Borrowed(MISSING_LOCATION),
        },
        Directive::Location => {
            let mut text = String::new();
            let _ = write!(
                text,
                "{}({})",
                location.file_name().unwrap_or(MISSING_LOCATION),
                location
                    .line
                    .map_or_else(|| MISSING_LOCATION.to_string(), |l| l.to_string())
            );
            Cow::Owned(text)
        }
        Directive::Message => Cow::Borrowed(&event.message),
        Directive::NewLine => Cow::Borrowed("\n"),
        Directive::MdcDump => Cow::Owned(event.mdc.to_string()),
        Directive::MdcValue(key) => Cow::Borrowed(event.mdc.get(key).unwrap_or("")),
        Directive::Date(format) => Cow::Owned(format.format(&event.timestamp)),
        Directive::Relative => Cow::Owned(event.elapsed_millis.to_string()),
        Directive::Thread => Cow::Borrowed(event.thread_name.as_deref().unwrap_or(&event.thread_id)),
        Directive::NestedContext => Cow::Borrowed(event.ndc.as_deref().unwrap_or(EMPTY_NDC)),
        Directive::ProcessId => Cow::Owned(event.process_id.to_string()),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::core::log_event::CallSite;
    use crate::core::log_level::LogLevel;
    use crate::core::mdc::MdcSnapshot;

    fn event(level: LogLevel, logger: &str, message: &str) -> LogEvent {
        LogEvent::new(level, logger, message).with_location(CallSite::new(
            "tests/testLog.rs",
            178,
            "app::tests",
            "app::tests::test_pattern",
        ))
    }

    fn render(pattern: &str, event: &LogEvent) -> String {
        PatternLayout::compile(pattern).unwrap().format(event)
    }

    #[test]
    fn test_full_pattern_with_empty_mdc() {
        let line = render(
            "%-5p %c %C %M (%F:%L) %l - %m - %X%n",
            &event(LogLevel::Info, "", "This is INFO"),
        );
        assert_eq!(
            line,
            "INFO  root app::tests test_pattern (testLog.rs:178) testLog.rs(178) - This is INFO - {}\n"
        );
    }

    #[test]
    fn test_mdc_dump_and_key() {
        let mdc: MdcSnapshot = [("x", "3"), ("y", "foo")].into_iter().collect();
        let event = event(LogLevel::Debug, "component", "msg").with_mdc(mdc);

        assert_eq!(render("%m %X", &event), "msg {{x,3}{y,foo}}");
        assert_eq!(render("[%X{y}] [%X{missing}]", &event), "[foo] []");
    }

    #[test]
    fn test_width_modifiers() {
        let event = event(LogLevel::Warn, "a.b.c", "m");
        assert_eq!(render("[%-5p]", &event), "[WARN ]");
        assert_eq!(render("[%6p]", &event), "[  WARN]");
        assert_eq!(render("[%.3c]", &event), "[b.c]");
        assert_eq!(render("[%-7.3c]", &event), "[b.c    ]");
    }

    #[test]
    fn test_logger_name_components() {
        let event = event(LogLevel::Info, "a.b.c", "m");
        assert_eq!(render("%c{1}", &event), "c");
        assert_eq!(render("%c{2}", &event), "b.c");
        assert_eq!(render("%c{5}", &event), "a.b.c");
    }

    #[test]
    fn test_unknown_directive_passes_through() {
        let event = event(LogLevel::Info, "x", "m");
        assert_eq!(render("%q %-5Q %m", &event), "%q %-5Q m");
        assert_eq!(render("100%% %m %", &event), "100% m %");
    }

    #[test]
    fn test_missing_location() {
        let event = LogEvent::new(LogLevel::Error, "x", "m");
        assert_eq!(render("%C|%M|%F|%L|%l", &event), "||?|?|?(?)");
    }

    #[test]
    fn test_thread_and_ndc() {
        let event = event(LogLevel::Info, "x", "m").with_thread_name("worker-1");
        assert_eq!(render("%t %x", &event), "worker-1 null");

        let event = event.with_ndc(Some("client=7 txn=42".to_string()));
        assert_eq!(render("%t %x", &event), "worker-1 client=7 txn=42");
    }

    #[test]
    fn test_date_directive() {
        let event = event(LogLevel::Info, "x", "m");
        let year = event.timestamp.format("%Y").to_string();
        assert_eq!(render("%d{%Y}", &event), year);
        assert!(render("%d", &event).ends_with('Z'));
    }

    #[test]
    fn test_compile_errors() {
        assert!(PatternLayout::compile("%d{%Y").is_err());
        assert!(PatternLayout::compile("%c{x}").is_err());
        assert!(PatternLayout::compile("%X{key").is_err());
        assert!(PatternLayout::compile("%99999999999999999999p %m").is_err());
        assert!(PatternLayout::compile("%.70000m").is_err());
        assert!(PatternLayout::compile(&format!("%{}p", MAX_FIELD_WIDTH)).is_ok());
    }

    #[test]
    fn test_rendering_is_repeatable() {
        let layout = PatternLayout::compile("%p %c - %m%n").unwrap();
        let event = event(LogLevel::Fatal, "svc", "down");
        assert_eq!(layout.format(&event), layout.format(&event));
        assert_eq!(layout.pattern(), "%p %c - %m%n");
    }
}
