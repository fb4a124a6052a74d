//! Global definitions of a compilation unit.

use crate::ast::{ExprValue, GlobalRef, Sign, TypeDefValue, Width};
use crate::error::{Error, Result};
use crate::legal;
use core::fmt;
use fnv::FnvHashMap;
use nested_modules::Context;

/// Definition or declaration of a global name.
#[derive(Clone, Debug)]
pub enum Global {
    TypeDef(legal::TypeDef),
    FuncDecl(legal::FuncDecl),
    ExternDecl(legal::FuncDecl),
    FuncDef(legal::FuncDef),
}

impl Global {
    /// Return the type of an expression referring to the global,
    /// or `None` if the global is a type.
    pub fn signature(&self) -> Option<legal::Pi> {
        match self {
            Self::TypeDef(_) => None,
            Self::FuncDecl(decl) | Self::ExternDecl(decl) => Some(decl.signature.clone()),
            Self::FuncDef(def) => Some(def.value.pi()),
        }
    }
}

/// Map from (module-qualified) names to global definitions.
///
/// Furthermore, configure how global definitions are unfolded during normalisation.
pub struct Env {
    ctx: Context<String, FnvHashMap<String, Global>>,
    /// maximal nesting of global definitions being unfolded
    pub unfold_limit: usize,
    /// maximal number of attempts to unfold global definitions per normalisation
    pub unfold_fuel: usize,
    /// unfold global function definitions at immutable call sites
    pub inline_globals: bool,
}

impl fmt::Debug for Env {
    fn fmt(&self, f: &mut fmt::Formatter) -> fmt::Result {
        f.debug_struct("Env")
            .field("unfold_limit", &self.unfold_limit)
            .field("unfold_fuel", &self.unfold_fuel)
            .field("inline_globals", &self.inline_globals)
            .finish_non_exhaustive()
    }
}

impl Default for Env {
    fn default() -> Self {
        Self {
            ctx: Default::default(),
            unfold_limit: 64,
            unfold_fuel: 4096,
            inline_globals: true,
        }
    }
}

impl Env {
    /// Construct an empty environment with default settings.
    ///
    /// ~~~
    /// # use pruvo::Env;
    /// let env = Env::new();
    /// assert!(env.inline_globals);
    /// assert_eq!(env.unfold_limit, 64);
    /// ~~~
    pub fn new() -> Self {
        Self::default()
    }

    /// Return the global that a reference points to.
    pub fn get(&self, global: &GlobalRef) -> Option<&Global> {
        self.ctx
            .find(global.path.iter())
            .find_map(|module| module.data.get(global.name.as_str()))
    }

    /// Return the function definition that a reference points to.
    pub fn func_def(&self, global: &GlobalRef) -> Option<&legal::FuncDef> {
        match self.get(global)? {
            Global::FuncDef(def) => Some(def),
            _ => None,
        }
    }

    /// Introduce a global in the current module.
    ///
    /// This fails if the name was already introduced,
    /// unless a function declaration is replaced by its definition.
    pub fn insert(&mut self, name: String, global: Global) -> Result<()> {
        let data = &mut self.ctx.get_mut().data;
        let replaces_decl = matches!(
            (data.get(&name), &global),
            (None, _) | (Some(Global::FuncDecl(_)), Global::FuncDef(_))
        );
        if !replaces_decl {
            return Err(Error::new(format!("redefinition of global {}", name)));
        }
        debug!("introduce global {}", name);
        data.insert(name, global);
        Ok(())
    }

    /// Remove a global from the current module, returning it.
    pub fn remove(&mut self, name: &str) -> Option<Global> {
        debug!("remove global {}", name);
        self.ctx.get_mut().data.remove(name)
    }

    /// Set the module in which subsequent globals are introduced.
    pub fn set_path(&mut self, path: Vec<String>) {
        while self.ctx.close() {}
        path.into_iter().for_each(|p| self.ctx.open_or_default(p))
    }

    /// Return the fixed-width integer type that a type denotes, resolving aliases.
    pub fn integer_type(&self, ty: &legal::Expr) -> Option<(Sign, Width)> {
        match &ty.value {
            ExprValue::IntegerT(sign, width) => Some((*sign, *width)),
            ExprValue::Global(g) => match self.get(g)? {
                Global::TypeDef(td) => match td.value {
                    TypeDefValue::Integer(sign, width) => Some((sign, width)),
                    TypeDefValue::Struct(_) => None,
                },
                _ => None,
            },
            _ => None,
        }
    }

    /// Return the fields of the struct that a type denotes.
    pub fn struct_fields(&self, ty: &legal::Expr) -> Option<&[legal::FuncArg]> {
        match &ty.value {
            ExprValue::Global(g) => match self.get(g)? {
                Global::TypeDef(td) => match &td.value {
                    TypeDefValue::Struct(fields) => Some(fields),
                    TypeDefValue::Integer(..) => None,
                },
                _ => None,
            },
            _ => None,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::typecheck::check_type_def;
    use crate::{raw, SourceLoc};

    fn byte() -> raw::TypeDef {
        raw::TypeDef {
            properties: SourceLoc::default(),
            name: "byte".to_string(),
            value: TypeDefValue::Integer(Sign::Unsigned, Width::W8),
        }
    }

    #[test]
    fn module_paths() {
        let mut env = Env::new();
        let local = GlobalRef::new("byte");
        let qualified = GlobalRef::qualified(vec!["mem".to_string()], "byte");

        env.set_path(vec!["mem".to_string()]);
        check_type_def(&mut env, &byte()).unwrap();
        assert!(env.get(&local).is_some());
        assert!(env.get(&qualified).is_none());

        env.set_path(Vec::new());
        assert!(env.get(&local).is_none());
        assert!(matches!(env.get(&qualified), Some(Global::TypeDef(_))));

        // modules do not clash with the root
        check_type_def(&mut env, &byte()).unwrap();
        assert!(env.get(&local).is_some());
        assert!(check_type_def(&mut env, &byte()).is_err());

        // reopening a module keeps its globals
        env.set_path(vec!["mem".to_string()]);
        assert!(check_type_def(&mut env, &byte()).is_err());
        assert!(env.remove("byte").is_some());
        env.set_path(Vec::new());
        assert!(env.get(&qualified).is_none());
        assert!(env.get(&local).is_some());
    }
}
