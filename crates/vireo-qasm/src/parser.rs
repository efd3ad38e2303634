//! Recursive-descent parser for the assembly circuit format.

use std::f64::consts::PI;

use vireo_ir::{Circuit, ClbitId, GateKind, GateOp, QubitId};

use crate::error::{ParseError, ParseResult};
use crate::lexer::{tokenize, Token};

/// Parse an assembly-format source string into a circuit.
pub fn parse(source: &str) -> ParseResult<Circuit> {
    let mut parser = Parser::new(source)?;
    parser.parse_program()
}

/// A declared register: base offset into the flat index space, and size.
#[derive(Debug, Clone, Copy)]
struct Register {
    base: u32,
    size: u32,
}

struct Parser {
    tokens: Vec<Token>,
    pos: usize,
    qregs: Vec<(String, Register)>,
    cregs: Vec<(String, Register)>,
    num_qubits: u32,
    num_clbits: u32,
}

/// A parsed operand: one concrete index or a whole register (broadcast).
enum Operand {
    Single(u32),
    Whole { name: String, base: u32, size: u32 },
}

impl Parser {
    fn new(source: &str) -> ParseResult<Self> {
        Ok(Self {
            tokens: tokenize(source)?,
            pos: 0,
            qregs: vec![],
            cregs: vec![],
            num_qubits: 0,
            num_clbits: 0,
        })
    }

    fn is_eof(&self) -> bool {
        self.pos >= self.tokens.len()
    }

    fn peek(&self) -> Option<&Token> {
        self.tokens.get(self.pos)
    }

    fn advance(&mut self) -> Option<Token> {
        let token = self.tokens.get(self.pos).cloned();
        if token.is_some() {
            self.pos += 1;
        }
        token
    }

    fn expect(&mut self, expected: &Token) -> ParseResult<()> {
        let found = self
            .advance()
            .ok_or_else(|| ParseError::UnexpectedEof(format!("expected {expected}")))?;
        if std::mem::discriminant(&found) != std::mem::discriminant(expected) {
            return Err(ParseError::UnexpectedToken {
                expected: expected.to_string(),
                found: found.to_string(),
            });
        }
        Ok(())
    }

    fn consume(&mut self, token: &Token) -> bool {
        if self
            .peek()
            .is_some_and(|t| std::mem::discriminant(t) == std::mem::discriminant(token))
        {
            self.pos += 1;
            true
        } else {
            false
        }
    }

    // =========================================================================
    // Grammar
    // =========================================================================

    fn parse_program(&mut self) -> ParseResult<Circuit> {
        self.parse_header()?;

        // Declarations and statements may interleave; registers must be
        // declared before use.
        let mut ops: Vec<GateOp> = vec![];
        while !self.is_eof() {
            match self.peek() {
                Some(Token::Include) => self.parse_include()?,
                Some(Token::QReg) => self.parse_qreg()?,
                Some(Token::CReg) => self.parse_creg()?,
                Some(Token::Measure) => ops.extend(self.parse_measure()?),
                Some(Token::Barrier) => ops.push(self.parse_barrier()?),
                Some(Token::Identifier(_)) => ops.extend(self.parse_gate()?),
                Some(other) => {
                    return Err(ParseError::UnexpectedToken {
                        expected: "statement".into(),
                        found: other.to_string(),
                    })
                }
                None => break,
            }
        }

        Ok(Circuit::from_ops(self.num_qubits, self.num_clbits, ops)?)
    }

    fn parse_header(&mut self) -> ParseResult<()> {
        self.expect(&Token::OpenQasm)
            .map_err(|_| ParseError::InvalidVersion("missing OPENQASM header".into()))?;
        let version = match self.advance() {
            Some(Token::FloatLiteral(v)) => v,
            Some(Token::IntLiteral(v)) => v as f64,
            other => {
                return Err(ParseError::InvalidVersion(format!(
                    "expected version number, found {}",
                    other.map_or_else(|| "end of input".into(), |t| t.to_string())
                )))
            }
        };
        if version.trunc() as i64 != 2 {
            return Err(ParseError::InvalidVersion(format!(
                "unsupported version {version}"
            )));
        }
        self.expect(&Token::Semicolon)?;
        Ok(())
    }

    fn parse_include(&mut self) -> ParseResult<()> {
        self.expect(&Token::Include)?;
        self.expect(&Token::StringLiteral(String::new()))?;
        self.expect(&Token::Semicolon)?;
        Ok(())
    }

    fn parse_qreg(&mut self) -> ParseResult<()> {
        self.expect(&Token::QReg)?;
        let (name, size) = self.parse_reg_decl()?;
        if self.qregs.iter().any(|(n, _)| *n == name) {
            return Err(ParseError::DuplicateRegister(name));
        }
        self.qregs.push((
            name,
            Register {
                base: self.num_qubits,
                size,
            },
        ));
        self.num_qubits += size;
        Ok(())
    }

    fn parse_creg(&mut self) -> ParseResult<()> {
        self.expect(&Token::CReg)?;
        let (name, size) = self.parse_reg_decl()?;
        if self.cregs.iter().any(|(n, _)| *n == name) {
            return Err(ParseError::DuplicateRegister(name));
        }
        self.cregs.push((
            name,
            Register {
                base: self.num_clbits,
                size,
            },
        ));
        self.num_clbits += size;
        Ok(())
    }

    fn parse_reg_decl(&mut self) -> ParseResult<(String, u32)> {
        let name = self.parse_identifier()?;
        self.expect(&Token::LBracket)?;
        let size = self.parse_index()?;
        self.expect(&Token::RBracket)?;
        self.expect(&Token::Semicolon)?;
        Ok((name, size))
    }

    fn parse_identifier(&mut self) -> ParseResult<String> {
        match self.advance() {
            Some(Token::Identifier(name)) => Ok(name),
            Some(other) => Err(ParseError::UnexpectedToken {
                expected: "identifier".into(),
                found: other.to_string(),
            }),
            None => Err(ParseError::UnexpectedEof("expected identifier".into())),
        }
    }

    fn parse_index(&mut self) -> ParseResult<u32> {
        match self.advance() {
            Some(Token::IntLiteral(v)) => Ok(v as u32),
            Some(other) => Err(ParseError::UnexpectedToken {
                expected: "integer".into(),
                found: other.to_string(),
            }),
            None => Err(ParseError::UnexpectedEof("expected integer".into())),
        }
    }

    fn lookup(regs: &[(String, Register)], name: &str) -> Option<Register> {
        regs.iter()
            .find(|(n, _)| n == name)
            .map(|&(_, reg)| reg)
    }

    /// Parse one operand: `name[index]` or bare `name` (whole register).
    fn parse_operand(&mut self, quantum: bool) -> ParseResult<Operand> {
        let name = self.parse_identifier()?;
        let regs = if quantum { &self.qregs } else { &self.cregs };
        let reg =
            Self::lookup(regs, &name).ok_or_else(|| ParseError::UndeclaredRegister(name.clone()))?;

        if self.consume(&Token::LBracket) {
            let index = self.parse_index()?;
            self.expect(&Token::RBracket)?;
            if index >= reg.size {
                return Err(ParseError::IndexOutOfBounds {
                    register: name,
                    index,
                    size: reg.size,
                });
            }
            Ok(Operand::Single(reg.base + index))
        } else {
            Ok(Operand::Whole {
                name,
                base: reg.base,
                size: reg.size,
            })
        }
    }

    fn parse_gate(&mut self) -> ParseResult<Vec<GateOp>> {
        let name = self.parse_identifier()?;
        let kind = GateKind::from_name(&name).ok_or_else(|| ParseError::UnknownGate(name.clone()))?;
        if matches!(kind, GateKind::Measure | GateKind::Barrier) {
            return Err(ParseError::UnknownGate(name));
        }

        let params = if self.consume(&Token::LParen) {
            let mut params = vec![self.parse_expr()?];
            while self.consume(&Token::Comma) {
                params.push(self.parse_expr()?);
            }
            self.expect(&Token::RParen)?;
            params
        } else {
            vec![]
        };

        if params.len() != kind.num_params() {
            return Err(ParseError::WrongParameterCount {
                gate: name,
                expected: kind.num_params(),
                got: params.len(),
            });
        }

        let mut operands = vec![self.parse_operand(true)?];
        while self.consume(&Token::Comma) {
            operands.push(self.parse_operand(true)?);
        }
        self.expect(&Token::Semicolon)?;

        let arity = kind.num_qubits().unwrap_or(0) as usize;

        // Whole-register broadcast is supported for single-qubit gates only.
        if arity == 1 && operands.len() == 1 {
            if let Operand::Whole { base, size, .. } = operands[0] {
                return Ok((0..size)
                    .map(|i| {
                        GateOp::parametric(kind, [QubitId(base + i)], params.iter().copied())
                    })
                    .collect());
            }
        }

        let qubits: Vec<QubitId> = operands
            .iter()
            .map(|operand| match operand {
                Operand::Single(idx) => Ok(QubitId(*idx)),
                Operand::Whole { name, .. } => Err(ParseError::UnexpectedToken {
                    expected: "indexed operand".into(),
                    found: name.clone(),
                }),
            })
            .collect::<ParseResult<_>>()?;

        if qubits.len() != arity {
            return Err(ParseError::WrongQubitCount {
                gate: name,
                expected: arity,
                got: qubits.len(),
            });
        }

        Ok(vec![GateOp::parametric(kind, qubits, params)])
    }

    fn parse_measure(&mut self) -> ParseResult<Vec<GateOp>> {
        self.expect(&Token::Measure)?;
        let qubit = self.parse_operand(true)?;
        self.expect(&Token::Arrow)?;
        let clbit = self.parse_operand(false)?;
        self.expect(&Token::Semicolon)?;

        match (qubit, clbit) {
            (Operand::Single(q), Operand::Single(c)) => {
                Ok(vec![GateOp::measure(QubitId(q), ClbitId(c))])
            }
            (
                Operand::Whole {
                    base: qb, size: qs, ..
                },
                Operand::Whole {
                    base: cb, size: cs, ..
                },
            ) => {
                if qs != cs {
                    return Err(ParseError::BroadcastMismatch(qs, cs));
                }
                Ok((0..qs)
                    .map(|i| GateOp::measure(QubitId(qb + i), ClbitId(cb + i)))
                    .collect())
            }
            _ => Err(ParseError::UnexpectedToken {
                expected: "matching measure operands".into(),
                found: "mixed indexed and whole-register".into(),
            }),
        }
    }

    fn parse_barrier(&mut self) -> ParseResult<GateOp> {
        self.expect(&Token::Barrier)?;
        let mut qubits: Vec<QubitId> = vec![];
        loop {
            match self.parse_operand(true)? {
                Operand::Single(q) => qubits.push(QubitId(q)),
                Operand::Whole { base, size, .. } => {
                    qubits.extend((0..size).map(|i| QubitId(base + i)));
                }
            }
            if !self.consume(&Token::Comma) {
                break;
            }
        }
        self.expect(&Token::Semicolon)?;
        Ok(GateOp::barrier(qubits))
    }

    // =========================================================================
    // Parameter expressions: + - * / with unary minus, pi, parentheses
    // =========================================================================

    fn parse_expr(&mut self) -> ParseResult<f64> {
        let mut value = self.parse_term()?;
        loop {
            if self.consume(&Token::Plus) {
                value += self.parse_term()?;
            } else if self.consume(&Token::Minus) {
                value -= self.parse_term()?;
            } else {
                return Ok(value);
            }
        }
    }

    fn parse_term(&mut self) -> ParseResult<f64> {
        let mut value = self.parse_factor()?;
        loop {
            if self.consume(&Token::Star) {
                value *= self.parse_factor()?;
            } else if self.consume(&Token::Slash) {
                value /= self.parse_factor()?;
            } else {
                return Ok(value);
            }
        }
    }

    fn parse_factor(&mut self) -> ParseResult<f64> {
        match self.advance() {
            Some(Token::Minus) => Ok(-self.parse_factor()?),
            Some(Token::Plus) => self.parse_factor(),
            Some(Token::Pi) => Ok(PI),
            Some(Token::FloatLiteral(v)) => Ok(v),
            Some(Token::IntLiteral(v)) => Ok(v as f64),
            Some(Token::LParen) => {
                let value = self.parse_expr()?;
                self.expect(&Token::RParen)?;
                Ok(value)
            }
            Some(other) => Err(ParseError::UnexpectedToken {
                expected: "parameter expression".into(),
                found: other.to_string(),
            }),
            None => Err(ParseError::UnexpectedEof("expected parameter".into())),
        }
    }
}
