use std::path::PathBuf;

xflags::xflags! {
    /// Cycle-accurate simulator of a five-stage pipelined RV32I processor.
    cmd PipeSimArgs {
        /// Path to the instruction-memory image (ASCII binary, 32 digits per instruction).
        required imem_file: PathBuf

        /// Path to the data-memory image (ASCII hex, one word per line).
        required dmem_file: PathBuf

        /// Number of clock cycles to simulate, including the 2-cycle reset window.
        /// Defaults to 50.
        optional -c, --cycles cycles: u32

        /// Enables history module, printing cycle and hazard counts after simulation.
        optional --history

        /// Enables verbose mode, printing detailed information during simulation.
        /// Largely used for debugging purposes.
        optional -v, --verbose
    }
}
