//! Expression AST consumed by the inference engine.
//!
//! There is no parser in this crate; front ends build these nodes directly,
//! and the helper constructors at the bottom keep that terse.

/// Literal values
#[derive(Debug, Clone, PartialEq)]
pub enum Literal {
    Num(f64),
    Bool(bool),
    Str(String),
    Null,
    Undefined,
}

/// A type annotation on a lambda parameter.
#[derive(Debug, Clone, PartialEq)]
pub enum TypeAnn {
    /// `number`, `string`, `boolean`, `null` or `undefined`.
    Prim(String),
    /// A literal type such as `5` or `"hi"`.
    Lit(Literal),
    /// A generic alias reference: `Array<number>`, `Promise<T>`.
    Ref { name: String, args: Vec<TypeAnn> },
    Fun {
        params: Vec<(String, TypeAnn)>,
        ret: Box<TypeAnn>,
    },
    Rec(Vec<(String, TypeAnn)>),
    Tuple(Vec<TypeAnn>),
    Union(Vec<TypeAnn>),
    /// A named type variable, shared by every use in the same lambda.
    Var(String),
}

/// A lambda parameter.
#[derive(Debug, Clone, PartialEq)]
pub struct Param {
    pub name: String,
    pub annotation: Option<TypeAnn>,
    /// May be left out at call sites.
    pub optional: bool,
    /// Collects the remaining arguments into an array. Only valid last.
    pub rest: bool,
}

impl Param {
    pub fn new(name: impl Into<String>) -> Self {
        Param {
            name: name.into(),
            annotation: None,
            optional: false,
            rest: false,
        }
    }

    pub fn annotated(name: impl Into<String>, annotation: TypeAnn) -> Self {
        Param {
            annotation: Some(annotation),
            ..Param::new(name)
        }
    }

    pub fn optional(mut self) -> Self {
        self.optional = true;
        self
    }

    pub fn rest(mut self) -> Self {
        self.rest = true;
        self
    }
}

/// Expressions
#[derive(Debug, Clone, PartialEq)]
pub enum Expr {
    Lit(Literal),
    Ident(String),
    Lam {
        params: Vec<Param>,
        body: Box<Expr>,
        is_async: bool,
    },
    App {
        func: Box<Expr>,
        args: Vec<Expr>,
    },
    Let {
        name: String,
        rec: bool,
        value: Box<Expr>,
        body: Box<Expr>,
    },
    /// Fixed point of a function; introduces recursion.
    Fix(Box<Expr>),
    If {
        cond: Box<Expr>,
        then: Box<Expr>,
        else_: Box<Expr>,
    },
    Await(Box<Expr>),
    Rec(Vec<(String, Expr)>),
    Tuple(Vec<Expr>),
    /// Member access `object.property` or `object[property]`.
    Mem {
        object: Box<Expr>,
        property: Box<Expr>,
    },
    /// Spread: `...expr`.
    Rest(Box<Expr>),
    TaggedTemplate {
        tag: String,
        quasis: Vec<String>,
        exprs: Vec<Expr>,
    },
}

/// A top-level declaration.
#[derive(Debug, Clone, PartialEq)]
pub struct Decl {
    pub name: String,
    pub rec: bool,
    pub value: Expr,
}

impl Decl {
    pub fn new(name: impl Into<String>, value: Expr) -> Self {
        Decl {
            name: name.into(),
            rec: false,
            value,
        }
    }

    pub fn rec(name: impl Into<String>, value: Expr) -> Self {
        Decl {
            name: name.into(),
            rec: true,
            value,
        }
    }
}

// === Builders ===

pub fn num(value: f64) -> Expr {
    Expr::Lit(Literal::Num(value))
}

pub fn bool_(value: bool) -> Expr {
    Expr::Lit(Literal::Bool(value))
}

pub fn str_(value: impl Into<String>) -> Expr {
    Expr::Lit(Literal::Str(value.into()))
}

pub fn null() -> Expr {
    Expr::Lit(Literal::Null)
}

pub fn undefined() -> Expr {
    Expr::Lit(Literal::Undefined)
}

pub fn ident(name: impl Into<String>) -> Expr {
    Expr::Ident(name.into())
}

/// A lambda with plain, unannotated parameters.
pub fn lam(params: &[&str], body: Expr) -> Expr {
    lam_with(params.iter().map(|p| Param::new(*p)).collect(), body)
}

pub fn lam_with(params: Vec<Param>, body: Expr) -> Expr {
    Expr::Lam {
        params,
        body: Box::new(body),
        is_async: false,
    }
}

pub fn async_lam(params: &[&str], body: Expr) -> Expr {
    Expr::Lam {
        params: params.iter().map(|p| Param::new(*p)).collect(),
        body: Box::new(body),
        is_async: true,
    }
}

pub fn app(func: Expr, args: Vec<Expr>) -> Expr {
    Expr::App {
        func: Box::new(func),
        args,
    }
}

pub fn let_(name: impl Into<String>, value: Expr, body: Expr) -> Expr {
    Expr::Let {
        name: name.into(),
        rec: false,
        value: Box::new(value),
        body: Box::new(body),
    }
}

pub fn let_rec(name: impl Into<String>, value: Expr, body: Expr) -> Expr {
    Expr::Let {
        name: name.into(),
        rec: true,
        value: Box::new(value),
        body: Box::new(body),
    }
}

pub fn fix(expr: Expr) -> Expr {
    Expr::Fix(Box::new(expr))
}

pub fn if_(cond: Expr, then: Expr, else_: Expr) -> Expr {
    Expr::If {
        cond: Box::new(cond),
        then: Box::new(then),
        else_: Box::new(else_),
    }
}

pub fn await_(expr: Expr) -> Expr {
    Expr::Await(Box::new(expr))
}

pub fn rec(props: Vec<(&str, Expr)>) -> Expr {
    Expr::Rec(
        props
            .into_iter()
            .map(|(name, value)| (name.to_string(), value))
            .collect(),
    )
}

pub fn tuple(elems: Vec<Expr>) -> Expr {
    Expr::Tuple(elems)
}

/// `object.name`
pub fn mem(object: Expr, name: impl Into<String>) -> Expr {
    Expr::Mem {
        object: Box::new(object),
        property: Box::new(ident(name)),
    }
}

/// `object[property]`
pub fn index(object: Expr, property: Expr) -> Expr {
    Expr::Mem {
        object: Box::new(object),
        property: Box::new(property),
    }
}

pub fn rest(expr: Expr) -> Expr {
    Expr::Rest(Box::new(expr))
}

pub fn tagged(tag: impl Into<String>, quasis: &[&str], exprs: Vec<Expr>) -> Expr {
    Expr::TaggedTemplate {
        tag: tag.into(),
        quasis: quasis.iter().map(|q| q.to_string()).collect(),
        exprs,
    }
}
