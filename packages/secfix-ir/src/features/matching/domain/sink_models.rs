//! Built-in sink models
//!
//! A sink model names a call shape and the operand of that call which must not
//! carry an attacker-influenced value. Only the `create-file` family is modeled:
//! constructors and methods that create, open for writing, or materialize a
//! file system entry.

use once_cell::sync::Lazy;

use super::signature::MethodSignature;

/// Operand of a sink call that receives the flowing value
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SinkTarget {
    /// Positional argument
    Argument(usize),
    /// Call receiver (`file.mkdirs()`)
    Receiver,
}

#[derive(Debug, Clone)]
pub struct SinkModel {
    pub signature: MethodSignature,
    pub target: SinkTarget,
}

const CREATE_FILE: &[(&str, SinkTarget)] = &[
    ("java.io.FileOutputStream <constructor>(java.io.File, ..)", SinkTarget::Argument(0)),
    ("java.io.FileOutputStream <constructor>(java.lang.String, ..)", SinkTarget::Argument(0)),
    ("java.io.FileWriter <constructor>(java.io.File, ..)", SinkTarget::Argument(0)),
    ("java.io.FileWriter <constructor>(java.lang.String, ..)", SinkTarget::Argument(0)),
    ("java.io.PrintWriter <constructor>(java.io.File, ..)", SinkTarget::Argument(0)),
    ("java.io.PrintWriter <constructor>(java.lang.String, ..)", SinkTarget::Argument(0)),
    ("java.io.PrintStream <constructor>(java.io.File, ..)", SinkTarget::Argument(0)),
    ("java.io.PrintStream <constructor>(java.lang.String, ..)", SinkTarget::Argument(0)),
    ("java.io.RandomAccessFile <constructor>(java.io.File, ..)", SinkTarget::Argument(0)),
    ("java.io.RandomAccessFile <constructor>(java.lang.String, ..)", SinkTarget::Argument(0)),
    ("java.nio.file.Files newOutputStream(java.nio.file.Path, ..)", SinkTarget::Argument(0)),
    ("java.nio.file.Files newBufferedWriter(java.nio.file.Path, ..)", SinkTarget::Argument(0)),
    ("java.nio.file.Files write(java.nio.file.Path, ..)", SinkTarget::Argument(0)),
    ("java.nio.file.Files createFile(java.nio.file.Path, ..)", SinkTarget::Argument(0)),
    ("java.nio.file.Files createDirectory(java.nio.file.Path, ..)", SinkTarget::Argument(0)),
    ("java.nio.file.Files createDirectories(java.nio.file.Path, ..)", SinkTarget::Argument(0)),
    ("java.nio.file.Files copy(*, java.nio.file.Path, ..)", SinkTarget::Argument(1)),
    ("java.nio.file.Files move(*, java.nio.file.Path, ..)", SinkTarget::Argument(1)),
    ("java.io.File createNewFile()", SinkTarget::Receiver),
    ("java.io.File mkdir()", SinkTarget::Receiver),
    ("java.io.File mkdirs()", SinkTarget::Receiver),
];

/// `create-file` sink models
pub static CREATE_FILE_SINKS: Lazy<Vec<SinkModel>> = Lazy::new(|| {
    CREATE_FILE
        .iter()
        .filter_map(|(descriptor, target)| {
            MethodSignature::parse(descriptor)
                .ok()
                .map(|signature| SinkModel {
                    signature,
                    target: *target,
                })
        })
        .collect()
});
