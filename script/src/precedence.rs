/// Precedence classes of the script language, loosest first.
///
/// The parser derives its binding powers from this table and the block code
/// generator uses it to decide where parentheses are needed, so both sides
/// always agree on how a piece of source text groups.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub enum Precedence {
    /// No constraint: a whole argument, condition or statement expression.
    None,
    /// `&&` `||`
    Logical,
    /// `==` `!=` `<` `<=` `>` `>=`
    Relational,
    /// `+` `-`
    Additive,
    /// `*` `/` `%`
    Multiplicative,
    /// prefix `-` and `!`
    Unary,
    /// Literals, identifiers, calls, member and index access, parenthesized groups.
    Atomic,
}

impl Precedence {
    /// The next tighter class. Right operands of a left-associative
    /// operator must bind at least this tightly to avoid regrouping.
    pub fn tighter(self) -> Precedence {
        match self {
            Precedence::None => Precedence::Logical,
            Precedence::Logical => Precedence::Relational,
            Precedence::Relational => Precedence::Additive,
            Precedence::Additive => Precedence::Multiplicative,
            Precedence::Multiplicative => Precedence::Unary,
            Precedence::Unary | Precedence::Atomic => Precedence::Atomic,
        }
    }

    /// Whether an expression of class `self` must be parenthesized when it
    /// appears in a position that requires `required`.
    pub fn needs_parens_in(self, required: Precedence) -> bool {
        self < required
    }
}
