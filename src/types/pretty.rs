//! TypeScript-style rendering of types and schemes.
//!
//! Unnamed variables are lettered in order of first appearance, skipping
//! letters already taken by named ones.

use std::collections::{HashMap, HashSet};
use std::fmt::{self, Display, Write};

use super::ty::{FnParam, Lit, MemberKey, Scheme, TVar, Type, TypeId, TypeKind};

/// The canonical name of the `idx`-th variable: a, b, ..., z, a1, b1, ...
pub(crate) fn var_name(idx: usize) -> String {
    let letter = char::from(b'a' + (idx % 26) as u8);
    if idx < 26 {
        letter.to_string()
    } else {
        format!("{}{}", letter, idx / 26)
    }
}

/// Context for pretty-printing, tracking variable names.
pub struct PrettyContext {
    /// Names generated for anonymous type variables.
    var_names: HashMap<TypeId, String>,
    /// Every name handed out so far, generated or explicit.
    used: HashSet<String>,
    /// Counter for generating fresh names.
    next_name: usize,
}

impl PrettyContext {
    /// Create a new pretty-printing context.
    pub fn new() -> Self {
        PrettyContext {
            var_names: HashMap::new(),
            used: HashSet::new(),
            next_name: 0,
        }
    }

    fn get_var_name(&mut self, id: TypeId, name: Option<&str>) -> String {
        if let Some(name) = name {
            self.used.insert(name.to_string());
            return name.to_string();
        }
        if let Some(name) = self.var_names.get(&id) {
            return name.clone();
        }

        let name = loop {
            let candidate = var_name(self.next_name);
            self.next_name += 1;
            if !self.used.contains(&candidate) {
                break candidate;
            }
        };
        self.used.insert(name.clone());
        self.var_names.insert(id, name.clone());
        name
    }

    /// Format a type to a string.
    pub fn format_type(&mut self, ty: &Type) -> String {
        let mut s = String::new();
        // Writing into a String cannot fail.
        let _ = self.write_type(&mut s, ty, false);
        s
    }

    /// Format a type scheme to a string.
    pub fn format_scheme(&mut self, scheme: &Scheme) -> String {
        let mut s = String::new();
        let _ = self.write_scheme(&mut s, scheme);
        s
    }

    /// Write a type. `nested` is set where a function or union would be
    /// ambiguous without parentheses.
    fn write_type<W: Write>(&mut self, w: &mut W, ty: &Type, nested: bool) -> fmt::Result {
        match &ty.kind {
            TypeKind::Var(name) => {
                let name = self.get_var_name(ty.id, name.as_deref());
                write!(w, "{}", name)
            }
            TypeKind::Prim(prim) => write!(w, "{}", prim.name()),
            TypeKind::Lit(lit) => write_lit(w, lit),

            TypeKind::Fun(fun) => {
                if nested {
                    write!(w, "(")?;
                }
                write!(w, "(")?;
                let last = fun.params.len().saturating_sub(1);
                for (i, param) in fun.params.iter().enumerate() {
                    if i > 0 {
                        write!(w, ", ")?;
                    }
                    self.write_param(w, param, fun.variadic && i == last)?;
                }
                write!(w, ") => ")?;
                self.write_type(w, &fun.ret, false)?;
                if nested {
                    write!(w, ")")?;
                }
                Ok(())
            }

            TypeKind::Gen(generic) => {
                write!(w, "{}", generic.name)?;
                if !generic.args.is_empty() {
                    write!(w, "<")?;
                    self.write_list(w, &generic.args, ", ")?;
                    write!(w, ">")?;
                }
                Ok(())
            }

            TypeKind::Rec(props) => {
                write!(w, "{{")?;
                for (i, (name, ty)) in props.iter().enumerate() {
                    if i > 0 {
                        write!(w, ", ")?;
                    }
                    write!(w, "{}: ", name)?;
                    self.write_type(w, ty, false)?;
                }
                write!(w, "}}")
            }

            TypeKind::Tuple(types) => {
                write!(w, "[")?;
                self.write_list(w, types, ", ")?;
                write!(w, "]")
            }

            TypeKind::Union(types) => {
                if nested {
                    write!(w, "(")?;
                }
                for (i, member) in types.iter().enumerate() {
                    if i > 0 {
                        write!(w, " | ")?;
                    }
                    self.write_type(w, member, true)?;
                }
                if nested {
                    write!(w, ")")?;
                }
                Ok(())
            }

            TypeKind::Mem { object, key } => {
                self.write_type(w, object, true)?;
                match key {
                    MemberKey::Name(name) => write!(w, ".{}", name),
                    MemberKey::Index(index) => write!(w, "[{}]", index),
                }
            }
        }
    }

    fn write_param<W: Write>(&mut self, w: &mut W, param: &FnParam, rest: bool) -> fmt::Result {
        if rest {
            write!(w, "...")?;
        }
        write!(w, "{}", param.name)?;
        if param.optional {
            write!(w, "?")?;
        }
        write!(w, ": ")?;
        self.write_type(w, &param.ty, false)
    }

    fn write_list<W: Write>(&mut self, w: &mut W, types: &[Type], sep: &str) -> fmt::Result {
        for (i, ty) in types.iter().enumerate() {
            if i > 0 {
                write!(w, "{}", sep)?;
            }
            self.write_type(w, ty, false)?;
        }
        Ok(())
    }

    /// Write a type scheme.
    fn write_scheme<W: Write>(&mut self, w: &mut W, scheme: &Scheme) -> fmt::Result {
        if !scheme.qualifiers.is_empty() {
            write!(w, "<")?;
            for (i, var) in scheme.qualifiers.iter().enumerate() {
                if i > 0 {
                    write!(w, ", ")?;
                }
                let name = self.get_var_name(var.id, var.name.as_deref());
                write!(w, "{}", name)?;
            }
            write!(w, ">")?;
        }

        self.write_type(w, &scheme.ty, false)
    }
}

fn write_lit<W: Write>(w: &mut W, lit: &Lit) -> fmt::Result {
    match lit {
        Lit::Num(value) => write!(w, "{}", value),
        Lit::Str(value) => write!(w, "{:?}", value),
        Lit::Bool(value) => write!(w, "{}", value),
    }
}

impl Default for PrettyContext {
    fn default() -> Self {
        Self::new()
    }
}

/// Display implementation for types using a fresh context.
impl Display for Type {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let mut ctx = PrettyContext::new();
        write!(f, "{}", ctx.format_type(self))
    }
}

impl Display for Scheme {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let mut ctx = PrettyContext::new();
        write!(f, "{}", ctx.format_scheme(self))
    }
}

impl Display for TVar {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match &self.name {
            Some(name) => write!(f, "{}", name),
            None => write!(f, "t{}", self.id),
        }
    }
}

impl Display for MemberKey {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            MemberKey::Name(name) => write!(f, "{}", name),
            MemberKey::Index(index) => write!(f, "{}", index),
        }
    }
}
