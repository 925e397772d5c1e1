//! Runtime support linked into every generated program.
//!
//! `println` and `input` follow the ordinary calling convention: the argument
//! sits just above `$sp` on entry and the result comes back in `$v0`.

/// Label jumped to by a failed bounds check.
pub const OUT_OF_BOUNDS: &str = "__crt_out_of_bounds";

/// Program entry; must come first in `.text`.
pub const ENTRY: &str = "    .globl main
main:
    jal f_main
    li $v0, 10
    syscall
";

pub const SUPPORT: &str = "\
# runtime
f_println:
    lw $a0, 4($sp)
    li $v0, 1
    syscall
    li $a0, 0x0a
    li $v0, 11
    syscall
    jr $ra
f_input:
    li $v0, 5
    syscall
    jr $ra
__crt_out_of_bounds:
    li $v0, 10
    syscall
";
