//! Elixir Term Conversion Utilities
//!
//! Converts parsed DTD structures and completion answers to Elixir terms.

use std::fmt::Display;

use rustler::{Encoder, Env, NewBinary, NifResult, Term};

use crate::content::Completion;
use crate::core::error::Result;
use crate::dtd::{Attribute, AttributeDefault, AttributeKind, CharRef, Dtd, Element};

// Pre-defined atoms for efficiency - created once at compile time
rustler::atoms! {
    ok,
    error,
    rejected,
    name,
    identifier,
    mode,
    elements,
    char_refs,
    empty,
    optional_start,
    optional_end,
    content_model,
    includes,
    excludes,
    attribute_count,
    kind,
    base,
    boolean,
    set,
    base_type,
    values,
    type_helper,
    default_mode,
    default_value,
    required,
    implied,
    current,
    conref,
    fixed,
    value,
}

/// Convert a string to a binary term (more efficient than .encode())
#[inline]
pub fn str_to_binary<'a>(env: Env<'a>, s: &str) -> Term<'a> {
    let bytes = s.as_bytes();
    let mut binary = NewBinary::new(env, bytes.len());
    binary.as_mut_slice().copy_from_slice(bytes);
    binary.into()
}

fn optional_binary<'a>(env: Env<'a>, s: Option<&str>) -> Term<'a> {
    match s {
        Some(s) => str_to_binary(env, s),
        None => rustler::types::atom::nil().encode(env),
    }
}

/// Build a list of binaries, prepending in reverse
pub fn strings_to_term<'a, I, S>(env: Env<'a>, items: I) -> Term<'a>
where
    I: IntoIterator<Item = S>,
    I::IntoIter: DoubleEndedIterator,
    S: AsRef<str>,
{
    let mut list = Term::list_new_empty(env);
    for item in items.into_iter().rev() {
        list = list.list_prepend(str_to_binary(env, item.as_ref()));
    }
    list
}

/// `{:error, message}`
pub fn error_to_term<'a>(env: Env<'a>, err: &impl Display) -> Term<'a> {
    (error(), err.to_string()).encode(env)
}

pub fn dtd_summary_to_term<'a>(env: Env<'a>, dtd: &Dtd) -> NifResult<Term<'a>> {
    let pairs = [
        (identifier().encode(env), str_to_binary(env, dtd.identifier())),
        (mode().encode(env), dtd.mode().encode(env)),
        (elements().encode(env), dtd.element_count().encode(env)),
        (char_refs().encode(env), dtd.char_ref_list("").len().encode(env)),
    ];
    Term::map_from_pairs(env, &pairs)
}

/// Element as a map of its declaration
pub fn element_to_term<'a>(env: Env<'a>, element: &Element) -> NifResult<Term<'a>> {
    let model = element.content_model();
    let pairs = [
        (name().encode(env), str_to_binary(env, element.name())),
        (empty().encode(env), element.is_empty().encode(env)),
        (optional_start().encode(env), element.has_optional_start().encode(env)),
        (optional_end().encode(env), element.has_optional_end().encode(env)),
        (
            content_model().encode(env),
            str_to_binary(env, &model.content().to_string()),
        ),
        (includes().encode(env), strings_to_term(env, model.includes())),
        (excludes().encode(env), strings_to_term(env, model.excludes())),
        (attribute_count().encode(env), element.attribute_count().encode(env)),
    ];
    Term::map_from_pairs(env, &pairs)
}

/// Attribute as a map: kind, type, allowed values and default
pub fn attribute_to_term<'a>(env: Env<'a>, attribute: &Attribute) -> NifResult<Term<'a>> {
    let nil = rustler::types::atom::nil().encode(env);
    let (kind_atom, base_term, values_term) = match attribute.kind() {
        AttributeKind::Base(base_name) => (base(), str_to_binary(env, base_name), nil),
        AttributeKind::Boolean => (boolean(), nil, nil),
        AttributeKind::Set(set_values) => (set(), nil, strings_to_term(env, set_values)),
    };
    let default = attribute.default();
    let mode_atom = match default {
        AttributeDefault::Required => required(),
        AttributeDefault::Implied => implied(),
        AttributeDefault::Current => current(),
        AttributeDefault::Conref => conref(),
        AttributeDefault::Fixed(_) => fixed(),
        AttributeDefault::Value(_) => value(),
    };

    let pairs = [
        (name().encode(env), str_to_binary(env, attribute.name())),
        (kind().encode(env), kind_atom.encode(env)),
        (base_type().encode(env), base_term),
        (values().encode(env), values_term),
        (type_helper().encode(env), optional_binary(env, attribute.type_helper())),
        (default_mode().encode(env), mode_atom.encode(env)),
        (default_value().encode(env), optional_binary(env, default.value())),
        (required().encode(env), attribute.is_required().encode(env)),
    ];
    Term::map_from_pairs(env, &pairs)
}

/// `{name, codepoint}`
pub fn char_ref_to_term<'a>(env: Env<'a>, char_ref: &CharRef) -> Term<'a> {
    (str_to_binary(env, char_ref.name()), char_ref.value() as u32).encode(env)
}

/// `{:ok, names, can_close}` or `{:error, {:rejected, index, name}}`
pub fn completion_to_term<'a>(env: Env<'a>, completion: &Completion) -> Term<'a> {
    match &completion.rejected {
        None => (
            ok(),
            strings_to_term(env, &completion.next),
            completion.can_close,
        )
            .encode(env),
        Some(rejection) => (
            error(),
            (rejected(), rejection.index, str_to_binary(env, &rejection.name)),
        )
            .encode(env),
    }
}

pub fn completion_result_to_term<'a>(env: Env<'a>, result: &Result<Completion>) -> Term<'a> {
    match result {
        Ok(completion) => completion_to_term(env, completion),
        Err(e) => error_to_term(env, e),
    }
}
