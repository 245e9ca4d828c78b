//! Naming and argument-shape rules shared by the compiler and decompiler.

/// Document keys of intrinsic operations are `Fn::<Name>`.
pub const FUNCTION_PREFIX: &str = "Fn::";

/// Namespace of pseudo parameters in the document (`AWS::Region`).
pub const PSEUDO_PREFIX: &str = "AWS::";

/// Base identifier of the pseudo parameter sugar (`AWS.Region`).
pub const PSEUDO_MARKER: &str = "AWS";

pub const REF_KEY: &str = "Ref";
pub const CONDITION_KEY: &str = "Condition";
pub const GET_ATT: &str = "GetAtt";

pub const EQUALS: &str = "Equals";
pub const AND: &str = "And";
pub const OR: &str = "Or";
pub const NOT: &str = "Not";
pub const IF: &str = "If";
pub const FIND_IN_MAP: &str = "FindInMap";

/// Functions whose arguments always render as an array, even with one argument.
const ALWAYS_ARRAY: [&str; 9] = [
    NOT,
    AND,
    OR,
    EQUALS,
    "Join",
    "Split",
    "Select",
    FIND_IN_MAP,
    "Cidr",
];

/// Names that are not callable because a dedicated syntax exists.
const FORBIDDEN: [(&str, &str); 2] = [
    (REF_KEY, "write the bare name instead, or AWS.Name for pseudo parameters"),
    (GET_ATT, "write Resource.Attribute or Resource[\"Attribute\", ...] instead"),
];

/// Words that cannot be used as bare references in expressions.
pub const RESERVED_WORDS: [&str; 10] = [
    "true",
    "false",
    "null",
    PSEUDO_MARKER,
    "Resource",
    "Parameter",
    "Output",
    "Mapping",
    "Condition",
    "Rule",
];

pub fn always_array(name: &str) -> bool {
    ALWAYS_ARRAY.contains(&name)
}

/// `If` and `FindInMap` take a bare declared name as their first argument
/// when called with two or more arguments.
pub fn takes_name_argument(name: &str) -> bool {
    name == IF || name == FIND_IN_MAP
}

pub fn forbidden_call_hint(name: &str) -> Option<&'static str> {
    FORBIDDEN
        .iter()
        .find(|(forbidden, _)| *forbidden == name)
        .map(|(_, hint)| *hint)
}

pub fn is_reserved(name: &str) -> bool {
    RESERVED_WORDS.contains(&name)
}

pub fn is_pseudo(name: &str) -> bool {
    name.starts_with(PSEUDO_PREFIX)
}

pub fn document_key(name: &str) -> String {
    format!("{}{}", FUNCTION_PREFIX, name)
}

/// `Fn::Join` -> `Join`.
pub fn function_name(key: &str) -> Option<&str> {
    key.strip_prefix(FUNCTION_PREFIX)
}
