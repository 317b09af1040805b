use thiserror::Error;

/// Every fatal condition the assembler can raise. All of them are "compile-time" in the sense of
/// §7: there is no local recovery, and the caller's only responses are to fix the input program
/// or (for `Io`) the filesystem.
#[derive(Error, Debug)]
pub enum AssemblyError {
    #[error("constant pool overflow: {count} constants pooled, at most 256 are addressable")]
    TooManyConstants { count: usize },

    #[error("global table overflow: {count} globals interned, at most 256 are addressable")]
    TooManyGlobals { count: usize },

    #[error(
        "constant at pool index {index} would be assigned ROM address 0x{address:04x}, \
         which falls inside the RAM region (>= 0x{min_ram:04x})"
    )]
    RomOverflow {
        index: usize,
        address: u32,
        min_ram: u32,
    },

    #[error("push-stack operand {depth} exceeds the maximum stack depth of 31")]
    StackTooDeep { depth: u32 },

    #[error("{instruction} operand {argc} exceeds the maximum argument count of 15")]
    ArgCountTooLarge { instruction: &'static str, argc: u32 },

    #[error("unknown primitive: {name:?}")]
    UnknownPrimitive { name: String },

    #[error("empty vectors have no on-disk representation for this VM family: {context}")]
    EmptyVector { context: String },

    #[error("label {label} referenced by instruction at index {site} was never defined")]
    UndefinedLabel { label: u32, site: usize },

    #[error("label {label} defined more than once (first at index {first}, again at {again})")]
    DuplicateLabel { label: u32, first: usize, again: usize },

    #[error(
        "instruction at index {site} targets label {label}, but no branch form in \
         {instruction} can reach it"
    )]
    BranchOutOfRange {
        instruction: &'static str,
        site: usize,
        label: u32,
    },

    #[error("fixed-point branch layout failed to converge after {passes} passes")]
    LayoutDidNotConverge { passes: usize },

    #[error("failed to write Intel HEX output")]
    Io(#[from] std::io::Error),

    #[error("failed to parse instruction stream as JSON")]
    Json(#[from] serde_json::Error),
}
