//! Syntax trees for types, terms, statements and declarations.
//!
//! All trees are parametrised by a type implementing [`Properties`],
//! which determines the annotation attached to every kind of node.
//! The parser produces trees annotated with source locations ([`Raw`]),
//! whereas the type checker produces trees annotated with
//! derivations and sorts ([`Legal`]).
//!
//! [`Raw`]: crate::raw::Raw
//! [`Legal`]: crate::legal::Legal

use core::fmt::{self, Display};
use num_bigint::BigInt;

/// Annotations attached to the nodes of a tree.
pub trait Properties: Clone + fmt::Debug {
    type Module: Clone + fmt::Debug;
    type TypeDef: Clone + fmt::Debug;
    type FuncDecl: Clone + fmt::Debug;
    type FuncDef: Clone + fmt::Debug;
    type FuncArg: Clone + fmt::Debug;
    type Body: Clone + fmt::Debug;
    type Stmt: Clone + fmt::Debug;
    type Expr: Clone + fmt::Debug;

    /// Return the type attached to an expression, if there is one.
    fn sort(props: &Self::Expr) -> Option<&Expr<Self>>;

    /// Return the type attached to an expression mutably, if there is one.
    ///
    /// Only this crate can call this function,
    /// because only this crate can construct a [`SortMut`].
    fn sort_mut(props: &mut Self::Expr, cap: SortMut) -> Option<&mut Expr<Self>>;
}

/// Permission to change the type attached to an expression.
pub struct SortMut(pub(crate) ());

/// Variable together with a disambiguation index.
///
/// Two variables denote the same binding iff both name and index coincide.
/// The index `0` is reserved for variables as they were written;
/// alpha-renaming only ever produces larger indices.
#[derive(Clone, Debug, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct IndexedVar {
    pub name: String,
    pub idx: usize,
}

impl IndexedVar {
    pub fn new(name: impl Into<String>) -> Self {
        Self::with_idx(name, 0)
    }

    pub fn with_idx(name: impl Into<String>, idx: usize) -> Self {
        let name = name.into();
        Self { name, idx }
    }
}

/// Reference to a global definition, optionally qualified by a module path.
#[derive(Clone, Debug, PartialEq, Eq, Hash)]
pub struct GlobalRef {
    pub path: Vec<String>,
    pub name: String,
}

impl GlobalRef {
    pub fn new(name: impl Into<String>) -> Self {
        Self::qualified(Vec::new(), name)
    }

    pub fn qualified(path: Vec<String>, name: impl Into<String>) -> Self {
        let name = name.into();
        Self { path, name }
    }
}

/// Intended usage multiplicity of a function argument.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Default)]
pub enum Qty {
    Zero,
    One,
    #[default]
    Many,
}

/// Whether a function may have side effects.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Default)]
pub enum IsMutable {
    #[default]
    No,
    Yes,
}

#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum Sign {
    Signed,
    Unsigned,
}

#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum Width {
    W8,
    W16,
    W32,
    W64,
}

impl Width {
    pub fn bits(self) -> u32 {
        match self {
            Self::W8 => 8,
            Self::W16 => 16,
            Self::W32 => 32,
            Self::W64 => 64,
        }
    }
}

#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum BoolOp {
    And,
    Or,
    Xor,
}

#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum RelOp {
    Eq,
    Neq,
    Lt,
    Lte,
    Gt,
    Gte,
}

#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum ArithOp {
    Plus,
    Minus,
    Mult,
    Div,
}

/// Expression, covering types as well as terms.
#[derive(Clone, Debug)]
pub struct Expr<P: Properties> {
    pub properties: P::Expr,
    pub value: ExprValue<P>,
}

#[derive(Clone, Debug)]
pub enum ExprValue<P: Properties> {
    /// type of types
    Typename,
    /// placeholder to be inferred
    Auto,
    BoolT,
    UnitT,
    CstrT,
    /// type of memory regions
    ScopeT,
    IntegerT(Sign, Width),
    /// proposition, inhabited by `{}` iff the condition holds
    TrueT(Box<Expr<P>>),
    /// element type and size
    ArrayT(Box<Expr<P>>, Box<Expr<P>>),
    /// element type and region
    RefT(Box<Expr<P>>, Box<Expr<P>>),
    BoolLit(bool),
    Numeric(BigInt),
    Str(String),
    Var(IndexedVar),
    Global(GlobalRef),
    App(Box<Expr<P>>, Vec<Expr<P>>),
    Abs(Abs<P>),
    Pi(Pi<P>),
    Sigma(Vec<FuncArg<P>>),
    InitList(Vec<Expr<P>>),
    Member(Box<Expr<P>>, String),
    Subscript(Box<Expr<P>>, Box<Expr<P>>),
    AddressOf(Box<Expr<P>>),
    Deref(Box<Expr<P>>),
    ScopeOf(Box<Expr<P>>),
    Not(Box<Expr<P>>),
    Bool(BoolOp, Box<Expr<P>>, Box<Expr<P>>),
    Rel(RelOp, Box<Expr<P>>, Box<Expr<P>>),
    Arith(ArithOp, Box<Expr<P>>, Box<Expr<P>>),
    /// value and its justification
    Because(Box<Expr<P>>, Box<Expr<P>>),
}

/// Argument of a binder, such as the `i32 x` in `(i32 x) -> bool`.
#[derive(Clone, Debug)]
pub struct FuncArg<P: Properties> {
    pub properties: P::FuncArg,
    pub qty: Qty,
    pub ty: Expr<P>,
    pub var: Option<IndexedVar>,
}

/// Dependent function type.
#[derive(Clone, Debug)]
pub struct Pi<P: Properties> {
    pub is_mutable: IsMutable,
    pub args: Vec<FuncArg<P>>,
    pub ret_type: Box<Expr<P>>,
}

/// Function abstraction.
#[derive(Clone, Debug)]
pub struct Abs<P: Properties> {
    pub is_mutable: IsMutable,
    pub args: Vec<FuncArg<P>>,
    pub ret_type: Box<Expr<P>>,
    pub body: Body<P>,
}

#[derive(Clone, Debug)]
pub struct Body<P: Properties> {
    pub properties: P::Body,
    pub stmts: Vec<Stmt<P>>,
}

#[derive(Clone, Debug)]
pub struct Stmt<P: Properties> {
    pub properties: P::Stmt,
    pub value: StmtValue<P>,
}

#[derive(Clone, Debug)]
pub enum StmtValue<P: Properties> {
    /// function call whose result is discarded
    Expr(Expr<P>),
    IfElse(IfElse<P>),
    Return(Option<Expr<P>>),
    /// unreachable program point, optionally with a justification
    Impossible(Option<Expr<P>>),
}

#[derive(Clone, Debug)]
pub struct IfElse<P: Properties> {
    pub cond: Expr<P>,
    pub true_branch: Body<P>,
    pub false_branch: Option<Body<P>>,
}

#[derive(Clone, Debug)]
pub struct TypeDef<P: Properties> {
    pub properties: P::TypeDef,
    pub name: String,
    pub value: TypeDefValue<P>,
}

#[derive(Clone, Debug)]
pub enum TypeDefValue<P: Properties> {
    /// fixed-width integer alias
    Integer(Sign, Width),
    /// fields, where later field types may depend on earlier fields
    Struct(Vec<FuncArg<P>>),
}

/// Declaration of a function signature, either to be defined later in the
/// same unit (forward declaration) or provided by the linker (external).
#[derive(Clone, Debug)]
pub struct FuncDecl<P: Properties> {
    pub properties: P::FuncDecl,
    pub name: String,
    pub signature: Pi<P>,
}

#[derive(Clone, Debug)]
pub struct FuncDef<P: Properties> {
    pub properties: P::FuncDef,
    pub name: String,
    pub value: Abs<P>,
}

#[derive(Clone, Debug)]
pub enum Entry<P: Properties> {
    TypeDef(TypeDef<P>),
    FuncDecl(FuncDecl<P>),
    ExternDecl(FuncDecl<P>),
    FuncDef(FuncDef<P>),
}

/// Compilation unit.
#[derive(Clone, Debug)]
pub struct Module<P: Properties> {
    pub properties: P::Module,
    pub entries: Vec<Entry<P>>,
}

impl<P: Properties> Expr<P> {
    pub fn new(properties: P::Expr, value: ExprValue<P>) -> Self {
        Self { properties, value }
    }

    /// Return true if the expression is a boolean literal with the given value.
    pub fn is_bool_lit(&self, b: bool) -> bool {
        matches!(self.value, ExprValue::BoolLit(x) if x == b)
    }
}

impl<P: Properties> ExprValue<P> {
    /// Return the direct subexpressions, excluding the bodies of abstractions.
    pub fn children(&self) -> Vec<&Expr<P>> {
        use ExprValue::*;
        match self {
            Typename | Auto | BoolT | UnitT | CstrT | ScopeT | IntegerT(..) => Vec::new(),
            BoolLit(_) | Numeric(_) | Str(_) | Var(_) | Global(_) => Vec::new(),
            TrueT(x) | AddressOf(x) | Deref(x) | ScopeOf(x) | Not(x) | Member(x, _) => {
                Vec::from([&**x])
            }
            ArrayT(x, y) | RefT(x, y) | Subscript(x, y) | Because(x, y) => Vec::from([&**x, &**y]),
            Bool(_, x, y) | Rel(_, x, y) | Arith(_, x, y) => Vec::from([&**x, &**y]),
            App(f, args) => core::iter::once(&**f).chain(args.iter()).collect(),
            Abs(abs) => arg_types(&abs.args).chain([&*abs.ret_type]).collect(),
            Pi(pi) => arg_types(&pi.args).chain([&*pi.ret_type]).collect(),
            Sigma(args) => arg_types(args).collect(),
            InitList(xs) => xs.iter().collect(),
        }
    }
}

fn arg_types<P: Properties>(args: &[FuncArg<P>]) -> impl Iterator<Item = &Expr<P>> {
    args.iter().map(|arg| &arg.ty)
}

impl<P: Properties> Abs<P> {
    /// Return the signature of the abstraction.
    pub fn pi(&self) -> Pi<P> {
        Pi {
            is_mutable: self.is_mutable,
            args: self.args.clone(),
            ret_type: self.ret_type.clone(),
        }
    }
}

impl<P: Properties> Body<P> {
    pub fn new(properties: P::Body, stmts: Vec<Stmt<P>>) -> Self {
        Self { properties, stmts }
    }
}

impl<P: Properties> Stmt<P> {
    pub fn new(properties: P::Stmt, value: StmtValue<P>) -> Self {
        Self { properties, value }
    }
}

impl Display for IndexedVar {
    fn fmt(&self, f: &mut fmt::Formatter) -> fmt::Result {
        if self.idx == 0 {
            self.name.fmt(f)
        } else {
            write!(f, "{}:{}", self.name, self.idx)
        }
    }
}

impl Display for GlobalRef {
    fn fmt(&self, f: &mut fmt::Formatter) -> fmt::Result {
        self.path.iter().try_for_each(|p| write!(f, "{}::", p))?;
        self.name.fmt(f)
    }
}

impl Display for Qty {
    fn fmt(&self, f: &mut fmt::Formatter) -> fmt::Result {
        match self {
            Self::Zero => write!(f, "0 "),
            Self::One => write!(f, "1 "),
            Self::Many => Ok(()),
        }
    }
}

impl Display for BoolOp {
    fn fmt(&self, f: &mut fmt::Formatter) -> fmt::Result {
        match self {
            Self::And => write!(f, "and"),
            Self::Or => write!(f, "or"),
            Self::Xor => write!(f, "xor"),
        }
    }
}

impl Display for RelOp {
    fn fmt(&self, f: &mut fmt::Formatter) -> fmt::Result {
        match self {
            Self::Eq => write!(f, "=="),
            Self::Neq => write!(f, "!="),
            Self::Lt => write!(f, "<"),
            Self::Lte => write!(f, "<="),
            Self::Gt => write!(f, ">"),
            Self::Gte => write!(f, ">="),
        }
    }
}

impl Display for ArithOp {
    fn fmt(&self, f: &mut fmt::Formatter) -> fmt::Result {
        match self {
            Self::Plus => write!(f, "+"),
            Self::Minus => write!(f, "-"),
            Self::Mult => write!(f, "*"),
            Self::Div => write!(f, "/"),
        }
    }
}

/// Format a list of items separated by `sep`.
fn fmt_sep<T: Display>(items: &[T], sep: &str, f: &mut fmt::Formatter) -> fmt::Result {
    let mut iter = items.iter();
    if let Some(first) = iter.next() {
        first.fmt(f)?;
    }
    iter.try_for_each(|x| write!(f, "{}{}", sep, x))
}

/// Format an operand, parenthesising it if it is an operator application itself.
fn fmt_operand<P: Properties>(x: &Expr<P>, f: &mut fmt::Formatter) -> fmt::Result {
    use ExprValue::*;
    match x.value {
        Not(_) | Bool(..) | Rel(..) | Arith(..) | Because(..) => write!(f, "({})", x),
        _ => x.fmt(f),
    }
}

fn fmt_block<P: Properties>(body: &Body<P>, f: &mut fmt::Formatter) -> fmt::Result {
    if body.stmts.is_empty() {
        write!(f, "{{}}")
    } else {
        write!(f, "{{ {} }}", body)
    }
}

impl<P: Properties> Display for FuncArg<P> {
    fn fmt(&self, f: &mut fmt::Formatter) -> fmt::Result {
        write!(f, "{}{}", self.qty, self.ty)?;
        self.var.iter().try_for_each(|v| write!(f, " {}", v))
    }
}

impl<P: Properties> Display for Pi<P> {
    fn fmt(&self, f: &mut fmt::Formatter) -> fmt::Result {
        write!(f, "(")?;
        fmt_sep(&self.args, ", ", f)?;
        match self.is_mutable {
            IsMutable::No => write!(f, ") -> {}", self.ret_type),
            IsMutable::Yes => write!(f, ") mutable -> {}", self.ret_type),
        }
    }
}

impl<P: Properties> Display for Abs<P> {
    fn fmt(&self, f: &mut fmt::Formatter) -> fmt::Result {
        write!(f, "{} ", self.pi())?;
        fmt_block(&self.body, f)
    }
}

impl<P: Properties> Display for Expr<P> {
    fn fmt(&self, f: &mut fmt::Formatter) -> fmt::Result {
        self.value.fmt(f)
    }
}

impl<P: Properties> Display for ExprValue<P> {
    fn fmt(&self, f: &mut fmt::Formatter) -> fmt::Result {
        use ExprValue::*;
        match self {
            Typename => write!(f, "typename"),
            Auto => write!(f, "auto"),
            BoolT => write!(f, "bool"),
            UnitT => write!(f, "unit_t"),
            CstrT => write!(f, "cstr_t"),
            ScopeT => write!(f, "scope_t"),
            IntegerT(Sign::Signed, w) => write!(f, "i{}", w.bits()),
            IntegerT(Sign::Unsigned, w) => write!(f, "u{}", w.bits()),
            TrueT(c) => write!(f, "true_t({})", c),
            ArrayT(ty, n) => write!(f, "array_t({}, {})", ty, n),
            RefT(ty, s) => write!(f, "ref_t({}, {})", ty, s),
            BoolLit(b) => b.fmt(f),
            Numeric(n) => n.fmt(f),
            Str(s) => write!(f, "{:?}", s),
            Var(v) => v.fmt(f),
            Global(g) => g.fmt(f),
            App(func, args) => {
                match func.value {
                    Abs(_) => write!(f, "({})", func)?,
                    _ => func.fmt(f)?,
                }
                write!(f, "(")?;
                fmt_sep(args, ", ", f)?;
                write!(f, ")")
            }
            Abs(abs) => abs.fmt(f),
            Pi(pi) => pi.fmt(f),
            Sigma(args) => {
                write!(f, "(")?;
                fmt_sep(args, "; ", f)?;
                write!(f, ")")
            }
            InitList(xs) => {
                write!(f, "{{")?;
                fmt_sep(xs, ", ", f)?;
                write!(f, "}}")
            }
            Member(x, field) => {
                fmt_operand(x, f)?;
                write!(f, ".{}", field)
            }
            Subscript(x, i) => {
                fmt_operand(x, f)?;
                write!(f, "[{}]", i)
            }
            AddressOf(x) => write!(f, "addressof({})", x),
            Deref(x) => write!(f, "deref({})", x),
            ScopeOf(x) => write!(f, "scopeof({})", x),
            Not(x) => {
                write!(f, "not ")?;
                fmt_operand(x, f)
            }
            Bool(op, x, y) => fmt_binary(x, op, y, f),
            Rel(op, x, y) => fmt_binary(x, op, y, f),
            Arith(op, x, y) => fmt_binary(x, op, y, f),
            Because(x, y) => fmt_binary(x, "because", y, f),
        }
    }
}

fn fmt_binary<P: Properties, Op: Display>(
    x: &Expr<P>,
    op: Op,
    y: &Expr<P>,
    f: &mut fmt::Formatter,
) -> fmt::Result {
    fmt_operand(x, f)?;
    write!(f, " {} ", op)?;
    fmt_operand(y, f)
}

impl<P: Properties> Display for Body<P> {
    fn fmt(&self, f: &mut fmt::Formatter) -> fmt::Result {
        fmt_sep(&self.stmts, " ", f)
    }
}

impl<P: Properties> Display for Stmt<P> {
    fn fmt(&self, f: &mut fmt::Formatter) -> fmt::Result {
        match &self.value {
            StmtValue::Expr(x) => write!(f, "{};", x),
            StmtValue::IfElse(IfElse {
                cond,
                true_branch,
                false_branch,
            }) => {
                write!(f, "if ({}) ", cond)?;
                fmt_block(true_branch, f)?;
                false_branch.iter().try_for_each(|fb| {
                    write!(f, " else ")?;
                    fmt_block(fb, f)
                })
            }
            StmtValue::Return(None) => write!(f, "return;"),
            StmtValue::Return(Some(x)) => write!(f, "return {};", x),
            StmtValue::Impossible(None) => write!(f, "impossible;"),
            StmtValue::Impossible(Some(x)) => write!(f, "impossible because {};", x),
        }
    }
}

impl<P: Properties> Display for TypeDef<P> {
    fn fmt(&self, f: &mut fmt::Formatter) -> fmt::Result {
        write!(f, "typedef {} = ", self.name)?;
        match &self.value {
            TypeDefValue::Integer(Sign::Signed, w) => write!(f, "i{};", w.bits()),
            TypeDefValue::Integer(Sign::Unsigned, w) => write!(f, "u{};", w.bits()),
            TypeDefValue::Struct(fields) => {
                write!(f, "struct {{ ")?;
                fields.iter().try_for_each(|field| write!(f, "{}; ", field))?;
                write!(f, "}};")
            }
        }
    }
}

impl<P: Properties> Display for Entry<P> {
    fn fmt(&self, f: &mut fmt::Formatter) -> fmt::Result {
        match self {
            Self::TypeDef(td) => td.fmt(f),
            Self::FuncDecl(decl) => write!(f, "{}: {};", decl.name, decl.signature),
            Self::ExternDecl(decl) => write!(f, "extern {}: {};", decl.name, decl.signature),
            Self::FuncDef(def) => write!(f, "{} = {}", def.name, def.value),
        }
    }
}

impl<P: Properties> Display for Module<P> {
    fn fmt(&self, f: &mut fmt::Formatter) -> fmt::Result {
        self.entries.iter().try_for_each(|e| writeln!(f, "{}", e))
    }
}
