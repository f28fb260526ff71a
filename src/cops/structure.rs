//! Token and block structure of the IR text.
//!
//! One pass shared by every cop: tokenize the IR, then recover its block
//! skeleton (brace blocks from tags, do/keyword blocks from embedded code)
//! and its argument lists (from multi-line tag attributes). The scanner is
//! tolerant; unbalanced closers are dropped and unterminated blocks are
//! reported without a closer.

use crate::source::Range;

// ---------------------------------------------------------------------------
// Tokens
// ---------------------------------------------------------------------------

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Keyword {
    Begin,
    End,
    Do,
    If,
    Unless,
    Case,
    While,
    Until,
    For,
    Def,
    Class,
    Module,
    Else,
    Elsif,
    When,
    Rescue,
    Ensure,
    Then,
}

impl Keyword {
    fn from_ident(ident: &str) -> Option<Self> {
        Some(match ident {
            "begin" => Keyword::Begin,
            "end" => Keyword::End,
            "do" => Keyword::Do,
            "if" => Keyword::If,
            "unless" => Keyword::Unless,
            "case" => Keyword::Case,
            "while" => Keyword::While,
            "until" => Keyword::Until,
            "for" => Keyword::For,
            "def" => Keyword::Def,
            "class" => Keyword::Class,
            "module" => Keyword::Module,
            "else" => Keyword::Else,
            "elsif" => Keyword::Elsif,
            "when" => Keyword::When,
            "rescue" => Keyword::Rescue,
            "ensure" => Keyword::Ensure,
            "then" => Keyword::Then,
            _ => return None,
        })
    }

    pub fn as_str(&self) -> &'static str {
        match self {
            Keyword::Begin => "begin",
            Keyword::End => "end",
            Keyword::Do => "do",
            Keyword::If => "if",
            Keyword::Unless => "unless",
            Keyword::Case => "case",
            Keyword::While => "while",
            Keyword::Until => "until",
            Keyword::For => "for",
            Keyword::Def => "def",
            Keyword::Class => "class",
            Keyword::Module => "module",
            Keyword::Else => "else",
            Keyword::Elsif => "elsif",
            Keyword::When => "when",
            Keyword::Rescue => "rescue",
            Keyword::Ensure => "ensure",
            Keyword::Then => "then",
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum TokenKind {
    Ident,
    Keyword(Keyword),
    Number,
    Str,
    LParen,
    RParen,
    LBrace,
    RBrace,
    Comma,
    Semi,
    Pipe,
    Op,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Token {
    pub kind: TokenKind,
    pub range: Range,
    /// 0-indexed IR line.
    pub line: usize,
    /// Byte column within the line.
    pub col: usize,
}

// ---------------------------------------------------------------------------
// Blocks and argument lists
// ---------------------------------------------------------------------------

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum BlockKind {
    /// `{ ... }` from an HTML tag pair.
    Brace,
    /// `do ... end`.
    Do,
    /// `begin ... end`.
    Begin,
    /// `if`/`unless`/`case`/`while`/`until`/`for`/`def`/`class`/`module`.
    Keyword(Keyword),
}

#[derive(Debug, Clone)]
pub struct Block {
    pub kind: BlockKind,
    /// The `{`, `do`, `begin` or keyword token.
    pub opener: Token,
    /// Line on which the opening statement starts.
    pub stmt_line: usize,
    /// Indentation of that line.
    pub stmt_indent: usize,
    pub closer: Option<Token>,
    /// `else`/`elsif`/`when`/`rescue`/`ensure` clause tokens.
    pub clauses: Vec<Token>,
    /// First token of each direct statement, one list per body segment
    /// (segments are split at clause keywords).
    pub segments: Vec<Vec<Token>>,
    /// A `while`/`until`/`for` header that may consume a syntactic `do`.
    awaiting_do: bool,
}

impl Block {
    pub fn is_multiline(&self) -> bool {
        match self.closer {
            Some(closer) => closer.line != self.opener.line,
            None => self
                .segments
                .iter()
                .flatten()
                .any(|t| t.line != self.opener.line),
        }
    }
}

#[derive(Debug, Clone)]
pub struct ArgList {
    pub open: Token,
    pub close: Option<Token>,
    /// First token of each argument.
    pub args: Vec<Token>,
    /// Indentation of the line where the call's statement starts.
    pub stmt_indent: usize,
    expecting_arg: bool,
}

impl ArgList {
    pub fn is_multiline(&self) -> bool {
        let last_line = self
            .close
            .map(|c| c.line)
            .or_else(|| self.args.last().map(|a| a.line));
        last_line.map(|l| l != self.open.line).unwrap_or(false)
    }
}

// ---------------------------------------------------------------------------
// Structure
// ---------------------------------------------------------------------------

/// Tokenized IR plus recovered blocks, argument lists and line geometry.
#[derive(Debug)]
pub struct Structure {
    pub tokens: Vec<Token>,
    pub blocks: Vec<Block>,
    pub arg_lists: Vec<ArgList>,
    line_starts: Vec<usize>,
    line_indents: Vec<usize>,
    /// First-to-last token byte span per line, None for blank lines.
    line_spans: Vec<Option<Range>>,
}

impl Structure {
    pub fn analyze(text: &str) -> Self {
        let (tokens, line_starts, line_indents) = tokenize(text);

        let mut line_spans: Vec<Option<Range>> = vec![None; line_starts.len()];
        for tok in &tokens {
            let span = &mut line_spans[tok.line];
            *span = Some(match span {
                Some(existing) => Range::new(existing.begin, tok.range.end),
                None => tok.range,
            });
        }

        let mut structure = Self {
            tokens,
            blocks: Vec::new(),
            arg_lists: Vec::new(),
            line_starts,
            line_indents,
            line_spans,
        };
        structure.recover_blocks();
        structure
    }

    pub fn line_start(&self, line: usize) -> usize {
        self.line_starts[line]
    }

    pub fn line_indent(&self, line: usize) -> usize {
        self.line_indents[line]
    }

    /// Byte span from the first to the last token on `line`.
    pub fn line_span(&self, line: usize) -> Option<Range> {
        self.line_spans.get(line).copied().flatten()
    }

    /// Whether `tok` is the first token on its line.
    pub fn is_line_first(&self, tok: &Token) -> bool {
        self.line_spans[tok.line]
            .map(|span| span.begin == tok.range.begin)
            .unwrap_or(false)
    }

    // -------------------------------------------------------------------
    // Block recovery
    // -------------------------------------------------------------------

    fn recover_blocks(&mut self) {
        let mut frames: Vec<Frame> = Vec::new();
        let mut expect_stmt = true;
        let mut stmt_line = 0usize;
        let mut stmt_indent = 0usize;
        let mut in_do_params = false;

        let tokens = self.tokens.clone();
        let mut i = 0;
        while i < tokens.len() {
            let tok = tokens[i];
            let line_first = self.is_line_first(&tok);

            if in_do_params {
                if tok.kind == TokenKind::Pipe {
                    in_do_params = false;
                    expect_stmt = true;
                }
                i += 1;
                continue;
            }

            // A token at the start of a line outside any argument list
            // begins a statement unless the previous line continues.
            let inside_args = matches!(frames.last(), Some(Frame::Paren(_)));
            let continuation = i > 0
                && matches!(
                    tokens[i - 1].kind,
                    TokenKind::Comma | TokenKind::Op | TokenKind::LParen
                );
            let starts_stmt =
                !inside_args && (expect_stmt || (line_first && !continuation));

            match tok.kind {
                TokenKind::LParen => {
                    self.arg_lists.push(ArgList {
                        open: tok,
                        close: None,
                        args: Vec::new(),
                        stmt_indent,
                        expecting_arg: true,
                    });
                    frames.push(Frame::Paren(self.arg_lists.len() - 1));
                    expect_stmt = false;
                }
                TokenKind::RParen => {
                    if let Some(pos) = frames.iter().rposition(|f| matches!(f, Frame::Paren(_))) {
                        if let Frame::Paren(idx) = frames[pos] {
                            self.arg_lists[idx].close = Some(tok);
                        }
                        frames.truncate(pos);
                    }
                    expect_stmt = false;
                }
                TokenKind::Comma => {
                    if let Some(Frame::Paren(idx)) = frames.last() {
                        self.arg_lists[*idx].expecting_arg = true;
                    }
                }
                TokenKind::LBrace => {
                    self.blocks.push(Block {
                        kind: BlockKind::Brace,
                        opener: tok,
                        stmt_line,
                        stmt_indent,
                        closer: None,
                        clauses: Vec::new(),
                        segments: vec![Vec::new()],
                        awaiting_do: false,
                    });
                    frames.push(Frame::Block(self.blocks.len() - 1));
                    expect_stmt = true;
                }
                TokenKind::RBrace => {
                    self.close_block(&mut frames, tok, |kind| kind == BlockKind::Brace);
                    expect_stmt = true;
                }
                TokenKind::Semi => {
                    expect_stmt = true;
                }
                TokenKind::Keyword(kw) => match kw {
                    Keyword::Do => {
                        let consumed_by_loop = frames
                            .iter()
                            .rev()
                            .find_map(|f| match f {
                                Frame::Block(idx) => Some(*idx),
                                Frame::Paren(_) => None,
                            })
                            .map(|idx| {
                                let block = &mut self.blocks[idx];
                                if block.awaiting_do && block.opener.line == tok.line {
                                    block.awaiting_do = false;
                                    true
                                } else {
                                    false
                                }
                            })
                            .unwrap_or(false);
                        if !consumed_by_loop {
                            self.blocks.push(Block {
                                kind: BlockKind::Do,
                                opener: tok,
                                stmt_line,
                                stmt_indent,
                                closer: None,
                                clauses: Vec::new(),
                                segments: vec![Vec::new()],
                                awaiting_do: false,
                            });
                            frames.push(Frame::Block(self.blocks.len() - 1));
                        }
                        if tokens.get(i + 1).map(|t| t.kind) == Some(TokenKind::Pipe) {
                            in_do_params = true;
                            i += 2;
                            continue;
                        }
                        expect_stmt = true;
                    }
                    Keyword::End => {
                        self.close_block(&mut frames, tok, |kind| kind != BlockKind::Brace);
                        expect_stmt = true;
                    }
                    Keyword::Else
                    | Keyword::Elsif
                    | Keyword::When
                    | Keyword::Rescue
                    | Keyword::Ensure => {
                        if let Some(idx) = innermost_block(&frames) {
                            let block = &mut self.blocks[idx];
                            block.clauses.push(tok);
                            block.segments.push(Vec::new());
                        }
                        expect_stmt = true;
                    }
                    Keyword::Then => {
                        expect_stmt = true;
                    }
                    Keyword::Begin
                    | Keyword::If
                    | Keyword::Unless
                    | Keyword::Case
                    | Keyword::While
                    | Keyword::Until
                    | Keyword::For
                    | Keyword::Def
                    | Keyword::Class
                    | Keyword::Module => {
                        // An opener either starts its statement or sits on
                        // an assignment/operator RHS (`x = if y`). Anywhere
                        // else the keyword is a trailing modifier.
                        let after_operator =
                            i > 0 && tokens[i - 1].kind == TokenKind::Op;
                        if starts_stmt || after_operator {
                            if starts_stmt {
                                self.record_statement(
                                    &frames,
                                    tok,
                                    &mut stmt_line,
                                    &mut stmt_indent,
                                );
                            }
                            let kind = if kw == Keyword::Begin {
                                BlockKind::Begin
                            } else {
                                BlockKind::Keyword(kw)
                            };
                            let awaiting_do =
                                matches!(kw, Keyword::While | Keyword::Until | Keyword::For);
                            self.blocks.push(Block {
                                kind,
                                opener: tok,
                                stmt_line,
                                stmt_indent,
                                closer: None,
                                clauses: Vec::new(),
                                segments: vec![Vec::new()],
                                awaiting_do,
                            });
                            frames.push(Frame::Block(self.blocks.len() - 1));
                            expect_stmt = matches!(kw, Keyword::Begin);
                        }
                        // Mid-expression keywords are statement modifiers.
                    }
                },
                TokenKind::Ident | TokenKind::Number | TokenKind::Str => {
                    if starts_stmt {
                        self.record_statement(&frames, tok, &mut stmt_line, &mut stmt_indent);
                    }
                    if let Some(Frame::Paren(idx)) = frames.last() {
                        let args = &mut self.arg_lists[*idx];
                        if args.expecting_arg {
                            args.args.push(tok);
                            args.expecting_arg = false;
                        }
                    }
                    expect_stmt = false;
                }
                TokenKind::Pipe | TokenKind::Op => {
                    expect_stmt = false;
                }
            }

            i += 1;
        }

        // Unterminated frames keep closer == None.
    }

    /// Record `tok` as the first token of a new statement and attach it to
    /// the innermost open block's current segment.
    fn record_statement(
        &mut self,
        frames: &[Frame],
        tok: Token,
        stmt_line: &mut usize,
        stmt_indent: &mut usize,
    ) {
        *stmt_line = tok.line;
        *stmt_indent = self.line_indents[tok.line];
        if let Some(idx) = innermost_block(frames) {
            let block = &mut self.blocks[idx];
            block.awaiting_do = false;
            block
                .segments
                .last_mut()
                .expect("blocks always hold one segment")
                .push(tok);
        }
    }

    /// Close the nearest open block matching `matches`; anything stacked
    /// above it (including unbalanced argument lists) is abandoned.
    fn close_block<F: Fn(BlockKind) -> bool>(
        &mut self,
        frames: &mut Vec<Frame>,
        closer: Token,
        matches: F,
    ) {
        let target = frames.iter().rposition(|f| match f {
            Frame::Block(idx) => matches(self.blocks[*idx].kind),
            Frame::Paren(_) => false,
        });
        if let Some(pos) = target {
            if let Frame::Block(idx) = frames[pos] {
                self.blocks[idx].closer = Some(closer);
            }
            frames.truncate(pos);
        }
        // No matching opener: a stray closer, ignored.
    }
}

#[derive(Debug, Clone, Copy)]
enum Frame {
    Block(usize),
    Paren(usize),
}

fn innermost_block(frames: &[Frame]) -> Option<usize> {
    frames.iter().rev().find_map(|f| match f {
        Frame::Block(idx) => Some(*idx),
        Frame::Paren(_) => None,
    })
}

// ---------------------------------------------------------------------------
// Tokenizer
// ---------------------------------------------------------------------------

fn tokenize(text: &str) -> (Vec<Token>, Vec<usize>, Vec<usize>) {
    let bytes = text.as_bytes();
    let mut tokens = Vec::new();
    let mut line_starts = vec![0usize];
    let mut p = 0;

    while p < bytes.len() {
        let b = bytes[p];
        match b {
            b'\n' => {
                line_starts.push(p + 1);
                p += 1;
            }
            b' ' | b'\t' | b'\r' => {
                p += 1;
            }
            b'#' => {
                // Comment to end of line.
                while p < bytes.len() && bytes[p] != b'\n' {
                    p += 1;
                }
            }
            b'"' | b'\'' => {
                let begin = p;
                let quote = b;
                p += 1;
                while p < bytes.len() && bytes[p] != quote {
                    if bytes[p] == b'\\' {
                        p += 1;
                    }
                    if p < bytes.len() && bytes[p] == b'\n' {
                        line_starts.push(p + 1);
                    }
                    p += 1;
                }
                p = (p + 1).min(bytes.len());
                push_token(&mut tokens, TokenKind::Str, begin, p, &line_starts);
            }
            b'(' | b')' | b'{' | b'}' | b',' | b';' | b'|' => {
                let kind = match b {
                    b'(' => TokenKind::LParen,
                    b')' => TokenKind::RParen,
                    b'{' => TokenKind::LBrace,
                    b'}' => TokenKind::RBrace,
                    b',' => TokenKind::Comma,
                    b';' => TokenKind::Semi,
                    _ => TokenKind::Pipe,
                };
                push_token(&mut tokens, kind, p, p + 1, &line_starts);
                p += 1;
            }
            _ if b.is_ascii_digit() => {
                let begin = p;
                while p < bytes.len() && bytes[p].is_ascii_digit() {
                    p += 1;
                }
                push_token(&mut tokens, TokenKind::Number, begin, p, &line_starts);
            }
            _ if b.is_ascii_alphabetic() || b == b'_' => {
                let begin = p;
                while p < bytes.len()
                    && (bytes[p].is_ascii_alphanumeric() || bytes[p] == b'_')
                {
                    p += 1;
                }
                if p < bytes.len() && matches!(bytes[p], b'?' | b'!') {
                    p += 1;
                }
                let kind = Keyword::from_ident(&text[begin..p])
                    .map(TokenKind::Keyword)
                    .unwrap_or(TokenKind::Ident);
                push_token(&mut tokens, kind, begin, p, &line_starts);
            }
            _ => {
                push_token(&mut tokens, TokenKind::Op, p, p + 1, &line_starts);
                p += 1;
            }
        }
    }

    let line_indents = line_starts
        .iter()
        .map(|&start| {
            bytes[start..]
                .iter()
                .take_while(|b| **b == b' ' || **b == b'\t')
                .count()
        })
        .collect();

    (tokens, line_starts, line_indents)
}

fn push_token(
    tokens: &mut Vec<Token>,
    kind: TokenKind,
    begin: usize,
    end: usize,
    line_starts: &[usize],
) {
    let line = match line_starts.binary_search(&begin) {
        Ok(l) => l,
        Err(insert) => insert - 1,
    };
    tokens.push(Token {
        kind,
        range: Range::new(begin, end),
        line,
        col: begin - line_starts[line],
    });
}

#[cfg(test)]
mod tests {
    use super::*;

    fn blocks_of(text: &str) -> Structure {
        Structure::analyze(text)
    }

    // ---------------------------------------------------------------------
    // Tokenizer
    // ---------------------------------------------------------------------

    #[test]
    fn test_tokenize_basics() {
        let s = Structure::analyze("tagt() {\n  hello_world\n};\n");
        let kinds: Vec<TokenKind> = s.tokens.iter().map(|t| t.kind).collect();
        assert_eq!(
            kinds,
            vec![
                TokenKind::Ident,
                TokenKind::LParen,
                TokenKind::RParen,
                TokenKind::LBrace,
                TokenKind::Ident,
                TokenKind::RBrace,
                TokenKind::Semi,
            ]
        );
        assert_eq!(s.tokens[4].line, 1);
        assert_eq!(s.tokens[4].col, 2);
    }

    #[test]
    fn test_tokenize_skips_comments_and_strings() {
        let s = Structure::analyze("# a { comment\nx = \"str { with } braces\"\n");
        assert!(s.blocks.is_empty(), "nothing in comments/strings opens blocks");
        let kinds: Vec<TokenKind> = s.tokens.iter().map(|t| t.kind).collect();
        assert_eq!(kinds, vec![TokenKind::Ident, TokenKind::Op, TokenKind::Str]);
    }

    // ---------------------------------------------------------------------
    // Block recovery
    // ---------------------------------------------------------------------

    #[test]
    fn test_brace_block_with_statement() {
        let s = blocks_of("tagt() {\n  hello\n};\n");
        assert_eq!(s.blocks.len(), 1);
        let block = &s.blocks[0];
        assert_eq!(block.kind, BlockKind::Brace);
        assert_eq!(block.stmt_line, 0);
        assert!(block.closer.is_some());
        assert_eq!(block.segments[0].len(), 1);
        assert_eq!(block.segments[0][0].line, 1);
    }

    #[test]
    fn test_do_block_with_params() {
        let s = blocks_of("10.times do |i|\n  i\nend\n");
        assert_eq!(s.blocks.len(), 1);
        let block = &s.blocks[0];
        assert_eq!(block.kind, BlockKind::Do);
        assert_eq!(block.stmt_line, 0);
        assert_eq!(block.stmt_indent, 0);
        assert_eq!(block.closer.unwrap().line, 2);
        // `i` is the only body statement; the params pipe is not one.
        assert_eq!(block.segments[0].len(), 1);
    }

    #[test]
    fn test_if_else_segments() {
        let s = blocks_of("if x\n  a\nelse\n  b\nend\n");
        let block = &s.blocks[0];
        assert_eq!(block.kind, BlockKind::Keyword(Keyword::If));
        assert_eq!(block.clauses.len(), 1);
        assert_eq!(block.segments.len(), 2);
        assert_eq!(block.segments[0].len(), 1);
        assert_eq!(block.segments[1].len(), 1);
    }

    #[test]
    fn test_trailing_if_modifier_is_not_a_block() {
        let s = blocks_of("a if x\n");
        assert!(s.blocks.is_empty());
    }

    #[test]
    fn test_while_do_is_loop_syntax() {
        let s = blocks_of("while x do\n  a\nend\n");
        assert_eq!(s.blocks.len(), 1);
        assert_eq!(s.blocks[0].kind, BlockKind::Keyword(Keyword::While));
    }

    #[test]
    fn test_begin_block() {
        let s = blocks_of("begin\n  foo\nend\n");
        assert_eq!(s.blocks[0].kind, BlockKind::Begin);
    }

    #[test]
    fn test_nested_blocks() {
        let s = blocks_of("tagt() {\n  10.times do |i|\n    i\n  end\n};\n");
        assert_eq!(s.blocks.len(), 2);
        let brace = &s.blocks[0];
        let do_block = &s.blocks[1];
        assert_eq!(brace.kind, BlockKind::Brace);
        assert_eq!(do_block.kind, BlockKind::Do);
        // The do line is the brace's only direct statement; `i` belongs to
        // the do block.
        assert_eq!(brace.segments[0].len(), 1);
        assert_eq!(do_block.segments[0].len(), 1);
    }

    #[test]
    fn test_stray_closers_are_ignored() {
        let s = blocks_of("};\nend\n");
        assert!(s.blocks.is_empty());
    }

    #[test]
    fn test_unterminated_block_has_no_closer() {
        let s = blocks_of("tagt() {\n  x\n");
        assert_eq!(s.blocks.len(), 1);
        assert!(s.blocks[0].closer.is_none());
    }

    // ---------------------------------------------------------------------
    // Argument lists
    // ---------------------------------------------------------------------

    #[test]
    fn test_multiline_arg_list() {
        let s = blocks_of("ta(linelinelinel,\n   linelineli) {\n};\n");
        assert_eq!(s.arg_lists.len(), 1);
        let args = &s.arg_lists[0];
        assert!(args.is_multiline());
        assert_eq!(args.args.len(), 2);
        assert_eq!(args.args[0].col, 3);
        assert_eq!(args.args[1].line, 1);
        assert_eq!(args.args[1].col, 3);
    }

    #[test]
    fn test_arg_lines_are_not_statements() {
        let s = blocks_of("tagt() {\n  ta(line,\n     line) {\n  };\n};\n");
        let outer = &s.blocks[0];
        // Only the inner tag's statement line counts as a child.
        assert_eq!(outer.segments[0].len(), 1);
    }

    #[test]
    fn test_same_line_arg_list_not_multiline() {
        let s = blocks_of("tagt(line) {};\n");
        assert!(!s.arg_lists[0].is_multiline());
    }
}
