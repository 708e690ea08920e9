// type_arena/display.rs
//
// Human-readable type names for diagnostics, e.g. `List[int]`.

use genus_identity::{DeclId, Symbol, TypeParamId};

use super::arena::TypeArena;
use super::sema_type::SemaType;
use super::type_id::TypeId;

/// Name lookups the arena cannot answer on its own.
pub trait TypeNames {
    fn symbol(&self, sym: Symbol) -> &str;
    fn decl_name(&self, decl: DeclId) -> &str;
    fn param_name(&self, param: TypeParamId) -> &str;
}

impl TypeArena {
    pub fn display(&self, ty: TypeId, names: &dyn TypeNames) -> String {
        let list = |types: &[TypeId]| -> String {
            types
                .iter()
                .map(|&t| self.display(t, names))
                .collect::<Vec<_>>()
                .join(", ")
        };
        match self.get(ty) {
            SemaType::Invalid => "<invalid>".to_string(),
            SemaType::Void => "()".to_string(),
            SemaType::Primitive(p) => p.as_str().to_string(),
            SemaType::Pointer(e) => format!("*{}", self.display(*e, names)),
            SemaType::Slice(e) => format!("[]{}", self.display(*e, names)),
            SemaType::Array { elem, len } => format!("[{}]{}", len, self.display(*elem, names)),
            SemaType::Map { key, value } => format!(
                "map[{}]{}",
                self.display(*key, names),
                self.display(*value, names)
            ),
            SemaType::Chan { elem, dir } => {
                format!("{}{}", dir.prefix(), self.display(*elem, names))
            }
            SemaType::Tuple(elems) => format!("({})", list(elems)),
            SemaType::Function { params, results } => {
                format!("func{}", self.signature(params, results, names))
            }
            SemaType::Struct(fields) => {
                let body: Vec<String> = fields
                    .iter()
                    .map(|f| format!("{} {}", names.symbol(f.name), self.display(f.ty, names)))
                    .collect();
                format!("struct{{{}}}", body.join("; "))
            }
            SemaType::Interface(methods) => {
                let body: Vec<String> = methods
                    .iter()
                    .map(|m| match self.unwrap_function(m.signature) {
                        Some((params, results)) => format!(
                            "{}{}",
                            names.symbol(m.name),
                            self.signature(params, results, names)
                        ),
                        None => names.symbol(m.name).to_string(),
                    })
                    .collect();
                format!("interface{{{}}}", body.join("; "))
            }
            SemaType::Named { decl, type_args } => {
                if type_args.is_empty() {
                    names.decl_name(*decl).to_string()
                } else {
                    format!("{}[{}]", names.decl_name(*decl), list(type_args))
                }
            }
            SemaType::TypeParam(p) => names.param_name(*p).to_string(),
        }
    }

    fn signature(&self, params: &[TypeId], results: &[TypeId], names: &dyn TypeNames) -> String {
        let params: Vec<String> = params.iter().map(|&t| self.display(t, names)).collect();
        let results: Vec<String> = results.iter().map(|&t| self.display(t, names)).collect();
        match results.len() {
            0 => format!("({})", params.join(", ")),
            1 => format!("({}) {}", params.join(", "), results[0]),
            _ => format!("({}) ({})", params.join(", "), results.join(", ")),
        }
    }
}
