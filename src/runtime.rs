use std::io::Write;

use crate::error::RunError;
use crate::isa::Opcode;
use crate::output::Output;

/// LS-8 can address 256 bytes of memory.
pub const MEMORY_SIZE: usize = 0x100;
/// Register 7 is reserved as the stack pointer.
pub const SP: u8 = 7;
/// Stack grows downward from just below the top of memory.
pub const STACK_START: u8 = 0xF4;

/// Represents complete CPU state during runtime.
pub struct RunState {
    /// System memory - 256 bytes, every `u8` is a valid address
    mem: [u8; MEMORY_SIZE],
    /// Program counter
    pc: u8,
    /// 8x 8-bit registers, R7 doubles as SP
    reg: [u8; 8],
    /// Print a trace line before each instruction
    trace: bool,
}

/// Where execution goes after an instruction.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum Flow {
    Continue(u8),
    Halt,
}

/// Summary of a run which ended with `HLT`.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct Halted {
    /// Address of the `HLT` instruction
    pub pc: u8,
    /// Instructions executed, including `HLT`
    pub cycles: u64,
}

/// Operand bytes following the opcode. Unused operands hold whatever memory does.
#[derive(Clone, Copy, Debug)]
struct Operands {
    a: u8,
    b: u8,
}

type Handler = fn(&mut RunState, Opcode, Operands, &mut dyn Write) -> Result<Flow, RunError>;

#[derive(Clone, Copy)]
struct Entry {
    op: Opcode,
    exec: Handler,
}

impl Default for RunState {
    fn default() -> Self {
        Self::new()
    }
}

impl RunState {
    pub fn new() -> RunState {
        let mut reg = [0; 8];
        reg[SP as usize] = STACK_START;
        RunState {
            mem: [0; MEMORY_SIZE],
            pc: 0,
            reg,
            trace: false,
        }
    }

    pub fn from_bytes(bytes: &[u8]) -> Result<RunState, RunError> {
        let mut state = RunState::new();
        state.load(bytes)?;
        Ok(state)
    }

    /// Copy `bytes` into memory starting at address 0.
    pub fn load(&mut self, bytes: &[u8]) -> Result<(), RunError> {
        if bytes.len() > MEMORY_SIZE {
            return Err(RunError::ProgramTooLarge { len: bytes.len() });
        }
        self.mem[..bytes.len()].copy_from_slice(bytes);
        Ok(())
    }

    pub fn set_trace(&mut self, trace: bool) {
        self.trace = trace;
    }

    #[inline]
    pub fn ram_read(&self, addr: u8) -> u8 {
        self.mem[addr as usize]
    }

    #[inline]
    pub fn ram_write(&mut self, addr: u8, val: u8) {
        self.mem[addr as usize] = val;
    }

    #[inline]
    pub fn pc(&self) -> u8 {
        self.pc
    }

    #[inline]
    pub fn sp(&self) -> u8 {
        self.reg(SP)
    }

    /// Register operands only ever select one of the 8 registers.
    #[inline]
    pub fn reg(&self, reg: u8) -> u8 {
        self.reg[(reg & 0b111) as usize]
    }

    #[inline]
    fn reg_mut(&mut self, reg: u8) -> &mut u8 {
        &mut self.reg[(reg & 0b111) as usize]
    }

    const OP_TABLE: [Option<Entry>; MEMORY_SIZE] = Self::op_table();

    const fn op_table() -> [Option<Entry>; MEMORY_SIZE] {
        let mut table: [Option<Entry>; MEMORY_SIZE] = [None; MEMORY_SIZE];
        let mut i = 0;
        while i < Opcode::ALL.len() {
            let op = Opcode::ALL[i];
            table[op.byte() as usize] = Some(Entry {
                op,
                exec: Self::handler(op),
            });
            i += 1;
        }
        table
    }

    const fn handler(op: Opcode) -> Handler {
        match op {
            Opcode::LDI => Self::ldi,
            Opcode::PRN => Self::prn,
            Opcode::HLT => Self::hlt,
            Opcode::ADD | Opcode::SUB | Opcode::MUL | Opcode::DIV => Self::arith,
            Opcode::PUSH => Self::push,
            Opcode::POP => Self::pop,
            Opcode::CALL => Self::call,
            Opcode::RET => Self::ret,
        }
    }

    /// Run until `HLT` or a fault, writing `PRN` output to `out`.
    pub fn run(&mut self, out: &mut dyn Write) -> Result<Halted, RunError> {
        let mut cycles = 0;
        loop {
            if self.trace {
                Output::Diagnostic.print_str(&format!("{}\n", self.trace()));
            }
            let pc = self.pc;
            cycles += 1;
            if self.step(out)? == Flow::Halt {
                return Ok(Halted { pc, cycles });
            }
        }
    }

    /// Execute the instruction at PC and move PC to the next one.
    pub fn step(&mut self, out: &mut dyn Write) -> Result<Flow, RunError> {
        let opcode = self.ram_read(self.pc);
        let Some(entry) = Self::OP_TABLE[opcode as usize] else {
            return Err(RunError::UnknownOpcode {
                opcode,
                pc: self.pc,
            });
        };
        let operands = Operands {
            a: self.ram_read(self.pc.wrapping_add(1)),
            b: self.ram_read(self.pc.wrapping_add(2)),
        };

        let flow = (entry.exec)(self, entry.op, operands, out)?;
        if let Flow::Continue(next) = flow {
            self.pc = next;
        }
        Ok(flow)
    }

    /// Perform `reg_a = reg_a <op> reg_b` with 8-bit wraparound.
    pub fn alu(&mut self, op: Opcode, reg_a: u8, reg_b: u8) -> Result<(), RunError> {
        let val_a = self.reg(reg_a);
        let val_b = self.reg(reg_b);
        let res = match op {
            Opcode::ADD => val_a.wrapping_add(val_b),
            Opcode::SUB => val_a.wrapping_sub(val_b),
            Opcode::MUL => val_a.wrapping_mul(val_b),
            Opcode::DIV => val_a
                .checked_div(val_b)
                .ok_or(RunError::DivisionByZero { pc: self.pc })?,
            _ => {
                return Err(RunError::UnsupportedAluOperation { opcode: op.byte() });
            }
        };
        *self.reg_mut(reg_a) = res;
        Ok(())
    }

    /// Format PC, the next three bytes and every register as hex.
    pub fn trace(&self) -> String {
        let mut line = format!(
            "TRACE: {:02X} | {:02X} {:02X} {:02X} |",
            self.pc,
            self.ram_read(self.pc),
            self.ram_read(self.pc.wrapping_add(1)),
            self.ram_read(self.pc.wrapping_add(2)),
        );
        for reg in self.reg {
            line.push_str(&format!(" {reg:02X}"));
        }
        line
    }

    #[inline]
    fn advance(&self, op: Opcode) -> Flow {
        Flow::Continue(self.pc.wrapping_add(op.width()))
    }

    fn push_val(&mut self, val: u8) {
        // Decrement stack
        let sp = self.sp().wrapping_sub(1);
        *self.reg_mut(SP) = sp;
        // Save onto stack
        self.ram_write(sp, val);
    }

    fn pop_val(&mut self) -> u8 {
        let sp = self.sp();
        let val = self.ram_read(sp);
        *self.reg_mut(SP) = sp.wrapping_add(1);
        val
    }

    fn ldi(&mut self, op: Opcode, ops: Operands, _out: &mut dyn Write) -> Result<Flow, RunError> {
        *self.reg_mut(ops.a) = ops.b;
        Ok(self.advance(op))
    }

    fn prn(&mut self, op: Opcode, ops: Operands, out: &mut dyn Write) -> Result<Flow, RunError> {
        writeln!(out, "{}", self.reg(ops.a))?;
        Ok(self.advance(op))
    }

    fn hlt(&mut self, _op: Opcode, _ops: Operands, out: &mut dyn Write) -> Result<Flow, RunError> {
        out.flush()?;
        Ok(Flow::Halt)
    }

    fn arith(&mut self, op: Opcode, ops: Operands, _out: &mut dyn Write) -> Result<Flow, RunError> {
        self.alu(op, ops.a, ops.b)?;
        Ok(self.advance(op))
    }

    fn push(&mut self, op: Opcode, ops: Operands, _out: &mut dyn Write) -> Result<Flow, RunError> {
        self.push_val(self.reg(ops.a));
        Ok(self.advance(op))
    }

    fn pop(&mut self, op: Opcode, ops: Operands, _out: &mut dyn Write) -> Result<Flow, RunError> {
        // Register is written before SP moves, so `POP R7` sees the increment
        let val = self.ram_read(self.sp());
        *self.reg_mut(ops.a) = val;
        let sp = self.sp().wrapping_add(1);
        *self.reg_mut(SP) = sp;
        Ok(self.advance(op))
    }

    fn call(&mut self, op: Opcode, ops: Operands, _out: &mut dyn Write) -> Result<Flow, RunError> {
        // Return to the instruction after CALL
        let ret = self.pc.wrapping_add(op.width());
        self.push_val(ret);
        // Read after the push, `CALL R7` jumps to the new SP
        Ok(Flow::Continue(self.reg(ops.a)))
    }

    fn ret(&mut self, _op: Opcode, _ops: Operands, _out: &mut dyn Write) -> Result<Flow, RunError> {
        Ok(Flow::Continue(self.pop_val()))
    }
}
