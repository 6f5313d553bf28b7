//! Shader interface reflection on top of naga's GLSL front end.
//!
//! naga reads the desktop GLSL 4.50 dialect, so GLSL ES 3.00 sources are
//! lowered first: the `#version 300 es` line becomes `#version 450 core`,
//! precision statements are blanked out and every `uniform` receives an
//! explicit binding. Each rewrite stays on its own line, so diagnostics keep
//! the line numbers of the original source.

use std::fmt::Write;

use naga::front::glsl::{Frontend, Options};
use naga::{AddressSpace, Binding, Handle, Module, ScalarKind, Type, TypeInner, VectorSize};

use super::ShaderStage;

/// A named interface variable and its GLSL type.
#[derive(Debug, Clone, PartialEq, Eq)]
pub(crate) struct Declaration {
    pub ty: String,
    pub name: String,
    /// `location` binding of stage inputs and outputs.
    pub location: Option<u32>,
}

#[derive(Debug)]
pub(crate) struct ShaderInterface {
    pub stage: ShaderStage,
    pub inputs: Vec<Declaration>,
    pub outputs: Vec<Declaration>,
    pub uniforms: Vec<Declaration>,
}

/// Parses `source` and returns its entry point interface, or a GL-style
/// info log with one `ERROR: 0:<line>: <message>` line per problem.
pub(crate) fn reflect(stage: ShaderStage, source: &str) -> Result<ShaderInterface, String> {
    let lowered = desktop_dialect(source)?;
    let options = Options::from(match stage {
        ShaderStage::Vertex => naga::ShaderStage::Vertex,
        ShaderStage::Fragment => naga::ShaderStage::Fragment,
    });
    let module = Frontend::default()
        .parse(&options, &lowered)
        .map_err(|failure| {
            failure
                .errors
                .iter()
                .map(|error| {
                    let line = error.meta.location(&lowered).line_number;
                    format!("ERROR: 0:{line}: {}", error.kind)
                })
                .collect::<Vec<_>>()
                .join("\n")
        })?;

    let entry = module
        .entry_points
        .iter()
        .find(|entry| entry.name == "main")
        .ok_or_else(|| "ERROR: 0:0: 'main' : function is not defined".to_string())?;

    let inputs = entry
        .function
        .arguments
        .iter()
        .filter_map(|argument| {
            interface_variable(&module, argument.name.as_ref(), argument.ty, &argument.binding)
        })
        .collect();

    let outputs = match entry
        .function
        .result
        .as_ref()
        .map(|result| &module.types[result.ty].inner)
    {
        Some(TypeInner::Struct { members, .. }) => members
            .iter()
            .filter_map(|member| {
                interface_variable(&module, member.name.as_ref(), member.ty, &member.binding)
            })
            .collect(),
        _ => Vec::new(),
    };

    let uniforms = module
        .global_variables
        .iter()
        .filter(|(_, global)| matches!(global.space, AddressSpace::Uniform | AddressSpace::Handle))
        .filter_map(|(_, global)| {
            Some(Declaration {
                ty: type_name(&module, global.ty),
                name: global.name.clone()?,
                location: None,
            })
        })
        .collect();

    Ok(ShaderInterface {
        stage,
        inputs,
        outputs,
        uniforms,
    })
}

/// Built-ins such as `gl_Position` carry no location and are skipped.
fn interface_variable(
    module: &Module,
    name: Option<&String>,
    ty: Handle<Type>,
    binding: &Option<Binding>,
) -> Option<Declaration> {
    let Some(Binding::Location { location, .. }) = binding else {
        return None;
    };
    Some(Declaration {
        ty: type_name(module, ty),
        name: name?.clone(),
        location: Some(*location),
    })
}

fn desktop_dialect(source: &str) -> Result<String, String> {
    let mut versioned = false;
    let mut next_binding = 0;
    let mut out = String::with_capacity(source.len() + 64);
    for line in source.lines() {
        let trimmed = line.trim();
        if let Some(version) = trimmed.strip_prefix("#version") {
            versioned = true;
            match version.split_whitespace().collect::<Vec<_>>().as_slice() {
                ["300", "es"] => out.push_str("#version 450 core"),
                _ => out.push_str(line),
            }
        } else if trimmed.starts_with("precision ") && trimmed.ends_with(';') {
            // Desktop GLSL accepts precision statements but gives them no meaning.
        } else {
            bind_uniforms(line, &mut next_binding, &mut out);
        }
        out.push('\n');
    }
    if !versioned {
        return Err("ERROR: 0:1: '' : missing #version directive".to_string());
    }
    Ok(out)
}

fn bind_uniforms(line: &str, next_binding: &mut u32, out: &mut String) {
    const KEYWORD: &str = "uniform";
    let mut rest = line;
    while let Some(at) = rest.find(KEYWORD) {
        out.push_str(&rest[..at]);
        let after = rest[at + KEYWORD.len()..].chars().next();
        let standalone = !out.chars().next_back().is_some_and(is_identifier_char)
            && !after.is_some_and(is_identifier_char);
        if standalone {
            let _ = write!(out, "layout(binding = {next_binding}) ");
            *next_binding += 1;
        }
        out.push_str(KEYWORD);
        rest = &rest[at + KEYWORD.len()..];
    }
    out.push_str(rest);
}

fn is_identifier_char(c: char) -> bool {
    c.is_ascii_alphanumeric() || c == '_'
}

fn type_name(module: &Module, ty: Handle<Type>) -> String {
    let prefix = |kind: ScalarKind| match kind {
        ScalarKind::Sint => "i",
        ScalarKind::Uint => "u",
        ScalarKind::Bool => "b",
        _ => "",
    };
    let size = |size: VectorSize| match size {
        VectorSize::Bi => 2,
        VectorSize::Tri => 3,
        VectorSize::Quad => 4,
    };
    match &module.types[ty].inner {
        TypeInner::Scalar(scalar) => match scalar.kind {
            ScalarKind::Sint => "int",
            ScalarKind::Uint => "uint",
            ScalarKind::Bool => "bool",
            _ => "float",
        }
        .to_string(),
        TypeInner::Vector { size: n, scalar } => format!("{}vec{}", prefix(scalar.kind), size(*n)),
        TypeInner::Matrix { columns, rows, .. } if columns == rows => format!("mat{}", size(*columns)),
        TypeInner::Matrix { columns, rows, .. } => format!("mat{}x{}", size(*columns), size(*rows)),
        TypeInner::Image { .. } | TypeInner::Sampler { .. } => "sampler".to_string(),
        TypeInner::Array { base, .. } => format!("{}[]", type_name(module, *base)),
        other => module.types[ty]
            .name
            .clone()
            .unwrap_or_else(|| format!("{other:?}")),
    }
}
