//! The cwmrc-style format: one `option arg...` statement per line.
//!
//! `#` starts a comment outside quotes, double quotes group words and
//! understand `\"` and `\\`, and a backslash right before a newline joins
//! the next line onto the current statement.

use std::iter::Peekable;
use std::str::Chars;

use crate::{ClientSpec, Config, ConfigError, KeySpec, COLOR_OPTIONS};

#[derive(Debug, Clone, PartialEq, Eq)]
enum Token {
    Word(String),
    Terminator,
}

struct Lexer<'a> {
    chars: Peekable<Chars<'a>>,
    line: usize,
}

impl<'a> Lexer<'a> {
    fn new(input: &'a str) -> Self {
        Self { chars: input.chars().peekable(), line: 1 }
    }

    fn bump(&mut self) -> Option<char> {
        let c = self.chars.next();
        if c == Some('\n') {
            self.line += 1;
        }
        c
    }

    fn skip_comment(&mut self) {
        while let Some(&c) = self.chars.peek() {
            if c == '\n' {
                break;
            }
            self.chars.next();
        }
    }

    /// Next token together with the line it started on, `None` at the end.
    fn next_token(&mut self) -> Result<Option<(Token, usize)>, ConfigError> {
        loop {
            let line = self.line;
            let Some(&c) = self.chars.peek() else {
                return Ok(None);
            };
            match c {
                ' ' | '\t' | '\r' => {
                    self.bump();
                }
                '#' => self.skip_comment(),
                '\n' => {
                    self.bump();
                    return Ok(Some((Token::Terminator, line)));
                }
                '"' => {
                    self.bump();
                    return self.quoted(line).map(|w| Some((Token::Word(w), line)));
                }
                '\\' => {
                    self.bump();
                    if self.chars.peek() == Some(&'\n') {
                        self.bump();
                        continue;
                    }
                    let mut word = String::from('\\');
                    self.bare(&mut word);
                    return Ok(Some((Token::Word(word), line)));
                }
                _ => {
                    let mut word = String::new();
                    self.bare(&mut word);
                    return Ok(Some((Token::Word(word), line)));
                }
            }
        }
    }

    fn quoted(&mut self, line: usize) -> Result<String, ConfigError> {
        let mut word = String::new();
        loop {
            match self.bump() {
                None => {
                    return Err(ConfigError::Syntax { line, reason: "unterminated string".to_string() });
                }
                Some('"') => return Ok(word),
                Some('\\') => match self.bump() {
                    Some(escaped @ ('"' | '\\')) => word.push(escaped),
                    // line continuation inside quotes
                    Some('\n') => {}
                    Some(other) => {
                        word.push('\\');
                        word.push(other);
                    }
                    None => {
                        return Err(ConfigError::Syntax { line, reason: "unterminated string".to_string() });
                    }
                },
                Some(c) => word.push(c),
            }
        }
    }

    fn bare(&mut self, word: &mut String) {
        while let Some(&c) = self.chars.peek() {
            match c {
                ' ' | '\t' | '\r' | '\n' | '#' => break,
                '\\' => {
                    self.bump();
                    if self.chars.peek() == Some(&'\n') {
                        self.bump();
                        break;
                    }
                    word.push('\\');
                }
                _ => {
                    self.bump();
                    word.push(c);
                }
            }
        }
    }
}

/// Splits the input into statements of words, dropping empty lines.
fn statements(input: &str) -> Result<Vec<(usize, Vec<String>)>, ConfigError> {
    let mut lexer = Lexer::new(input);
    let mut out = Vec::new();
    let mut current: Vec<String> = Vec::new();
    let mut start = 1;

    while let Some((token, line)) = lexer.next_token()? {
        match token {
            Token::Word(word) => {
                if current.is_empty() {
                    start = line;
                }
                current.push(word);
            }
            Token::Terminator => {
                if !current.is_empty() {
                    out.push((start, std::mem::take(&mut current)));
                }
            }
        }
    }
    if !current.is_empty() {
        out.push((start, current));
    }
    Ok(out)
}

fn arity(option: &str) -> Option<usize> {
    Some(match option {
        "autogroup" | "bind" | "color" | "command" | "mousebind" => 2,
        "borderwidth" | "fontname" | "ignore" | "moveamount" | "snapdist" | "sticky" => 1,
        "gap" => 4,
        _ => return None,
    })
}

pub(crate) fn parse(input: &str) -> Result<Config, ConfigError> {
    let mut config = Config::default();

    for (line, words) in statements(input)? {
        let (option, args) = (&words[0], &words[1..]);
        let expected = arity(option).ok_or_else(|| ConfigError::UnknownOption {
            line,
            option: option.clone(),
        })?;
        if args.len() != expected {
            return Err(ConfigError::Syntax {
                line,
                reason: format!("{} takes {} argument(s), got {}", option, expected, args.len()),
            });
        }
        apply(&mut config, line, option, args)?;
    }

    Ok(config)
}

fn apply(config: &mut Config, line: usize, option: &str, args: &[String]) -> Result<(), ConfigError> {
    let invalid = |value: &str| ConfigError::InvalidValue {
        line,
        option: option.to_string(),
        value: value.to_string(),
    };
    let number = |value: &str| -> Result<i32, ConfigError> {
        value.parse::<i32>().ok().filter(|n| *n >= 0).ok_or_else(|| invalid(value))
    };

    match option {
        "autogroup" => {
            let group = args[0].parse::<u32>().map_err(|_| invalid(&args[0]))?;
            let spec = ClientSpec::parse(&args[1]).map_err(|_| invalid(&args[1]))?;
            config.autogroups.insert(spec, group);
        }
        "bind" | "mousebind" => {
            let spec = KeySpec::parse(&args[0]).map_err(|_| invalid(&args[0]))?;
            let binds = if option == "bind" { &mut config.binds } else { &mut config.mouse_binds };
            if args[1] == "unmap" {
                binds.remove(&spec);
            } else {
                binds.insert(spec, args[1].clone());
            }
        }
        "borderwidth" => config.border_width = number(&args[0])?,
        "color" => {
            if !COLOR_OPTIONS.contains(&args[0].as_str()) {
                return Err(invalid(&args[0]));
            }
            config.colors.insert(args[0].clone(), args[1].clone());
        }
        "command" => {
            config.commands.insert(args[0].clone(), args[1].clone());
        }
        "fontname" => config.font = args[0].clone(),
        "gap" => {
            config.gap.top = number(&args[0])?;
            config.gap.bottom = number(&args[1])?;
            config.gap.left = number(&args[2])?;
            config.gap.right = number(&args[3])?;
        }
        "ignore" => config.ignores.push(args[0].clone()),
        "moveamount" => config.move_amount = number(&args[0])?,
        "snapdist" => config.snap_dist = number(&args[0])?,
        "sticky" => {
            config.sticky = match args[0].as_str() {
                "yes" => true,
                "no" => false,
                other => return Err(invalid(other)),
            }
        }
        _ => return Err(ConfigError::UnknownOption { line, option: option.to_string() }),
    }
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::Gap;
    use pretty_assertions::assert_eq;

    fn words(input: &str) -> Vec<Vec<String>> {
        statements(input).unwrap().into_iter().map(|(_, w)| w).collect()
    }

    #[test]
    fn test_lex_comments_and_blank_lines() {
        let input = "\n# heading\nborderwidth 2 # trailing\n\n\nsnapdist 4\n";
        assert_eq!(words(input), vec![vec!["borderwidth", "2"], vec!["snapdist", "4"]]);
    }

    #[test]
    fn test_lex_quotes_and_escapes() {
        let input = r#"command term "xterm -e \"tmux attach\"" "#;
        assert_eq!(words(input), vec![vec!["command", "term", r#"xterm -e "tmux attach""#]]);

        let input = r#"command sharp "echo # not a comment""#;
        assert_eq!(words(input)[0][2], "echo # not a comment");
    }

    #[test]
    fn test_lex_line_continuation() {
        let input = "gap 10 \\\n 20 30 40\nsnapdist 1";
        let statements = statements(input).unwrap();
        assert_eq!(statements[0], (1, vec!["gap", "10", "20", "30", "40"].into_iter().map(String::from).collect()));
        assert_eq!(statements[1].0, 3);
    }

    #[test]
    fn test_unterminated_string() {
        let err = parse("command x \"oops\n").unwrap_err();
        assert!(matches!(err, ConfigError::Syntax { line: 1, .. }));
    }

    #[test]
    fn test_parse_full() {
        let input = r##"
borderwidth 4
snapdist 10
moveamount 5
gap 20 0 5 5
color activeborder "#00ff00"
fontname "-*-terminus-*-r-*-*-20-*-*-*-*-*-iso10646-*"
command term xterm
autogroup 3 "xterm.XTerm"
ignore xclock
sticky yes
bind CM-Return terminal
bind 4-h pushleft
mousebind M-1 window_move
"##;
        let config = parse(input).unwrap();
        assert_eq!(config.border_width, 4);
        assert_eq!(config.snap_dist, 10);
        assert_eq!(config.move_amount, 5);
        assert_eq!(config.gap, Gap { top: 20, bottom: 0, left: 5, right: 5 });
        assert_eq!(config.color("activeborder"), Some("#00ff00"));
        assert_eq!(config.color("inactiveborder"), Some("#666666"));
        assert!(config.font.starts_with("-*-terminus"));
        assert_eq!(config.commands["term"], "xterm");
        assert_eq!(config.group_for("xterm", "XTerm"), Some(3));
        assert!(config.is_ignored("xclock"));
        assert!(config.sticky);
        assert_eq!(config.binds.len(), 2);
        assert_eq!(config.mouse_binds[&KeySpec::parse("M-1").unwrap()], "window_move");
    }

    #[test]
    fn test_unmap_removes_binding() {
        let config = parse("bind CM-Return terminal\nbind CM-Return unmap\n").unwrap();
        assert!(config.binds.is_empty());

        let config = parse("mousebind M-3 window_resize\nmousebind M-3 unmap\n").unwrap();
        assert!(config.mouse_binds.is_empty());
    }

    #[test]
    fn test_errors_carry_line_numbers() {
        let err = parse("borderwidth 1\nfrobnicate yes\n").unwrap_err();
        assert!(matches!(err, ConfigError::UnknownOption { line: 2, ref option } if option == "frobnicate"));

        let err = parse("\n\ngap 1 2 3\n").unwrap_err();
        assert!(matches!(err, ConfigError::Syntax { line: 3, .. }));

        let err = parse("sticky maybe").unwrap_err();
        assert!(matches!(err, ConfigError::InvalidValue { line: 1, .. }));

        let err = parse("borderwidth -1").unwrap_err();
        assert!(matches!(err, ConfigError::InvalidValue { .. }));

        let err = parse("color nosuchcolor red").unwrap_err();
        assert!(matches!(err, ConfigError::InvalidValue { .. }));
    }
}
