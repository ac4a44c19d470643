//! Single-pass analyser and code generator
//!
//! The analyser pulls tokens from the [`Lexer`], checks declarations and
//! types against the [`SymbolTable`], and appends stack-machine instructions
//! to the body of the function being compiled. There is no AST: every
//! construct is lowered as soon as it is recognised.
//!
//! Control flow is emitted forward with placeholder branches whose operands
//! are patched in place once the skipped region is complete. Branch offsets
//! count instructions from the one following the branch.

use crate::error::{semantic_error, unexpected_token};
use crate::lexer::{Keyword, Lexer, Punctuator, Token, TokenKind};
use crate::symbol_table::{
    FunctionInfo, PatchSite, Slot, SymbolCategory, SymbolEntry, SymbolTable, ENTRY_INDEX,
};
use bytecode_system::{Instruction, Opcode, BUILTIN_COUNT};
use core_types::{CompileError, CompileResult, ErrorKind, SourcePosition, Type};
use tracing::{debug, trace};

/// Index of the first user function
const FIRST_USER_FUNCTION: u32 = ENTRY_INDEX + 1;

/// Name of the function the entry function dispatches to
const MAIN_FUNCTION: &str = "main";

/// Result of a successful analysis pass
#[derive(Debug, Clone)]
pub struct AnalysedProgram {
    /// The finished symbol table, holding every function body
    pub table: SymbolTable,
    /// Function index of `main`, if declared
    pub main_index: Option<u32>,
    /// Position of the end of the source
    pub end: SourcePosition,
}

impl AnalysedProgram {
    /// Fail with `MainFunctionMissing` unless the program declares `main`
    pub fn ensure_main(&self) -> CompileResult<()> {
        match self.main_index {
            Some(_) => Ok(()),
            None => Err(CompileError::new(ErrorKind::MainFunctionMissing, self.end)),
        }
    }
}

/// Compilation context for one source file
pub struct Analyser {
    lexer: Lexer,
    table: SymbolTable,
    next_function_index: u32,
    main_index: Option<u32>,
    current_function: u32,
}

impl Analyser {
    /// Create an analyser over the given source
    pub fn new(source: &str) -> Self {
        Self {
            lexer: Lexer::new(source),
            table: SymbolTable::new(),
            next_function_index: FIRST_USER_FUNCTION,
            main_index: None,
            current_function: ENTRY_INDEX,
        }
    }

    /// Run the whole pass, stopping at the first error
    pub fn analyse(mut self) -> CompileResult<AnalysedProgram> {
        self.analyse_program()?;
        let end = self.lexer.position();
        Ok(AnalysedProgram {
            table: self.table,
            main_index: self.main_index,
            end,
        })
    }

    // Program structure

    fn analyse_program(&mut self) -> CompileResult<()> {
        loop {
            let token = self.lexer.peek_token()?.clone();
            match token.kind {
                TokenKind::EOF => break,
                TokenKind::Keyword(Keyword::Fn) => self.analyse_function()?,
                TokenKind::Keyword(Keyword::Let) => self.analyse_declaration(false)?,
                TokenKind::Keyword(Keyword::Const) => self.analyse_declaration(true)?,
                _ => return Err(unexpected_token(&["'fn'", "'let'", "'const'"], &token)),
            }
        }
        self.finish_entry()
    }

    /// Make the entry function dispatch to `main`
    fn finish_entry(&mut self) -> CompileResult<()> {
        self.current_function = ENTRY_INDEX;
        if let Some(main) = self.main_index {
            let ret_slots = self
                .table
                .function(main)
                .map_err(|k| self.internal_error(k))?
                .return_slots();
            self.emit_with(Opcode::StackAlloc, i64::from(ret_slots))?;
            self.emit_with(Opcode::Call, i64::from(main - ENTRY_INDEX))?;
        }
        Ok(())
    }

    fn analyse_function(&mut self) -> CompileResult<()> {
        self.expect_keyword(Keyword::Fn)?;
        let (name, name_token) = self.expect_identifier()?;

        self.expect_punct(Punctuator::LParen)?;
        let mut params = Vec::new();
        if !self.check_punct(Punctuator::RParen)? {
            loop {
                params.push(self.analyse_param()?);
                if !self.check_punct(Punctuator::Comma)? {
                    break;
                }
                self.lexer.next_token()?;
            }
        }
        self.expect_punct(Punctuator::RParen)?;
        self.expect_punct(Punctuator::Arrow)?;
        let return_type = self.expect_return_type()?;

        let index = self.next_function_index;
        let mut info = FunctionInfo::new(index, return_type.clone());
        info.params = params
            .iter()
            .map(|(param, ty, _, _)| (param.clone(), ty.clone()))
            .collect();
        self.table
            .declare(SymbolEntry::function(&name, info))
            .map_err(|k| semantic_error(k, &name_token))?;
        self.next_function_index += 1;
        if name == MAIN_FUNCTION {
            self.main_index = Some(index);
        }

        let layer = self.table.open_scope();
        for (arg_index, (param, ty, is_constant, token)) in params.into_iter().enumerate() {
            let mut entry =
                SymbolEntry::variable(&param, ty, layer, is_constant, Slot::Arg(arg_index as u32));
            entry.is_initialized = true;
            self.table
                .declare(entry)
                .map_err(|k| semantic_error(k, &token))?;
        }

        debug!(function = %name, index, layer, "entering function");
        self.current_function = index;
        self.analyse_block()?;
        if return_type == Type::Void {
            self.emit_op(Opcode::Ret)?;
        }

        let purged = self.table.close_scope(layer);
        debug!(function = %name, purged, "closed function scope");
        self.current_function = ENTRY_INDEX;
        Ok(())
    }

    /// `'const'? IDENT ':' TYPE`
    fn analyse_param(&mut self) -> CompileResult<(String, Type, bool, Token)> {
        let is_constant = self.check_keyword(Keyword::Const)?;
        if is_constant {
            self.lexer.next_token()?;
        }
        let (name, token) = self.expect_identifier()?;
        self.expect_punct(Punctuator::Colon)?;
        let ty = self.expect_value_type(&token)?;
        Ok((name, ty, is_constant, token))
    }

    // Statements

    fn analyse_block(&mut self) -> CompileResult<()> {
        self.expect_punct(Punctuator::LBrace)?;
        while !self.check_punct(Punctuator::RBrace)? {
            self.analyse_statement()?;
        }
        self.expect_punct(Punctuator::RBrace)?;
        Ok(())
    }

    fn analyse_statement(&mut self) -> CompileResult<()> {
        let token = self.lexer.peek_token()?.clone();
        match token.kind {
            TokenKind::Keyword(Keyword::Let) => self.analyse_declaration(false),
            TokenKind::Keyword(Keyword::Const) => self.analyse_declaration(true),
            TokenKind::Keyword(Keyword::If) => self.analyse_if(),
            TokenKind::Keyword(Keyword::While) => self.analyse_while(),
            TokenKind::Keyword(Keyword::Return) => self.analyse_return(),
            TokenKind::Punctuator(Punctuator::LBrace) => self.analyse_block(),
            TokenKind::Punctuator(Punctuator::Semicolon) => {
                self.lexer.next_token()?;
                Ok(())
            }
            _ => {
                self.analyse_expr()?;
                self.expect_punct(Punctuator::Semicolon)?;
                Ok(())
            }
        }
    }

    /// `let` or `const` declaration, global or local.
    ///
    /// A local index is reserved before the initialiser is compiled; the name
    /// only becomes visible after the terminating `;`.
    fn analyse_declaration(&mut self, is_constant: bool) -> CompileResult<()> {
        self.lexer.next_token()?;
        let (name, name_token) = self.expect_identifier()?;
        self.expect_punct(Punctuator::Colon)?;
        let ty = self.expect_value_type(&name_token)?;

        let layer = self.table.current_layer();
        let local_index = if layer == 0 {
            None
        } else {
            Some(self.reserve_local(&name)?)
        };

        let mut initialised = false;
        let mut global_site = None;
        if is_constant || self.check_punct(Punctuator::Assign)? {
            self.expect_punct(Punctuator::Assign)?;
            match local_index {
                Some(index) => {
                    self.emit_with(Opcode::Loca, i64::from(index))?;
                }
                None => global_site = Some(self.emit_placeholder(Opcode::Globa)?),
            }
            if self.analyse_expr()? == Type::Void {
                return Err(semantic_error(ErrorKind::InvalidAssignment, &name_token));
            }
            self.emit_op(Opcode::Store64)?;
            initialised = true;
        }
        self.expect_punct(Punctuator::Semicolon)?;

        let slot = match local_index {
            Some(index) => Slot::Local(index),
            None => Slot::Global(self.table.global_count()),
        };
        let mut entry = SymbolEntry::variable(&name, ty, layer, is_constant, slot);
        entry.is_initialized = initialised;
        self.table
            .declare(entry)
            .map_err(|k| semantic_error(k, &name_token))?;

        if let (Some(site), Slot::Global(global)) = (global_site, slot) {
            self.patch(site, i64::from(global))?;
        }
        Ok(())
    }

    /// ```text
    /// cond; [brtrue 1]; br skip; <then>; [br past_else; <else>]; br 0
    /// ```
    fn analyse_if(&mut self) -> CompileResult<()> {
        self.expect_keyword(Keyword::If)?;
        self.analyse_condition()?;
        let skip = self.emit_placeholder(Opcode::Br)?;
        self.analyse_block()?;

        let else_jump = if self.check_keyword(Keyword::Else)? {
            self.lexer.next_token()?;
            let jump = self.emit_placeholder(Opcode::Br)?;
            if self.check_keyword(Keyword::If)? {
                self.analyse_if()?;
            } else {
                self.analyse_block()?;
            }
            Some(jump)
        } else {
            None
        };

        // A false condition skips the then-block and the instruction after it,
        // which is either the else-jump or the landing pad.
        let then_end = match else_jump {
            Some(jump) => jump.position,
            None => self.instruction_count()?,
        };
        self.patch_jump(skip, then_end + 1)?;
        if let Some(jump) = else_jump {
            let else_end = self.instruction_count()?;
            self.patch_jump(jump, else_end + 1)?;
        }
        self.emit_with(Opcode::Br, 0)?;
        Ok(())
    }

    /// ```text
    /// br 0; L1: cond; [brtrue 1]; br exit; <body>; br L1
    /// ```
    fn analyse_while(&mut self) -> CompileResult<()> {
        self.expect_keyword(Keyword::While)?;
        self.emit_with(Opcode::Br, 0)?;
        let cond_start = self.instruction_count()?;
        self.analyse_condition()?;
        let exit = self.emit_placeholder(Opcode::Br)?;
        self.analyse_block()?;

        let back = self.instruction_count()?;
        self.emit_with(Opcode::Br, cond_start as i64 - (back as i64 + 1))?;
        self.patch_jump(exit, back + 1)?;
        Ok(())
    }

    /// Compile a condition so that it ends in a conditional branch that
    /// skips the next instruction when the condition holds.
    fn analyse_condition(&mut self) -> CompileResult<()> {
        self.analyse_expr()?;
        let last = self
            .table
            .last_opcode(self.current_function)
            .map_err(|k| self.internal_error(k))?;
        if !last.is_some_and(Opcode::is_conditional_branch) {
            self.emit_with(Opcode::BrTrue, 1)?;
        }
        Ok(())
    }

    fn analyse_return(&mut self) -> CompileResult<()> {
        let return_token = self.expect_keyword(Keyword::Return)?;
        let expected = self.current_return_type()?;

        if self.check_punct(Punctuator::Semicolon)? {
            if expected != Type::Void {
                return Err(semantic_error(ErrorKind::ReturnTypeWrong, &return_token));
            }
        } else {
            self.emit_with(Opcode::Arga, 0)?;
            let found = self.analyse_expr()?;
            if expected == Type::Void || found != expected {
                return Err(semantic_error(ErrorKind::ReturnTypeWrong, &return_token));
            }
            self.emit_op(Opcode::Store64)?;
        }
        self.emit_op(Opcode::Ret)?;
        self.expect_punct(Punctuator::Semicolon)?;
        Ok(())
    }

    // Expressions

    /// `Sum (('=='|'!='|'<'|'>'|'<='|'>=') Sum)?`
    fn analyse_expr(&mut self) -> CompileResult<Type> {
        let ty = self.analyse_sum()?;
        let op = match self.lexer.peek_token()?.kind {
            TokenKind::Punctuator(p) if p.is_comparison() => p,
            _ => return Ok(ty),
        };
        self.lexer.next_token()?;
        self.analyse_sum()?;

        self.emit_op(Opcode::CmpI)?;
        match op {
            Punctuator::EqEq => {
                self.emit_with(Opcode::BrFalse, 1)?;
            }
            Punctuator::NotEq => {
                self.emit_with(Opcode::BrTrue, 1)?;
            }
            Punctuator::Lt => {
                self.emit_op(Opcode::SetLt)?;
                self.emit_with(Opcode::BrTrue, 1)?;
            }
            Punctuator::Gt => {
                self.emit_op(Opcode::SetGt)?;
                self.emit_with(Opcode::BrTrue, 1)?;
            }
            Punctuator::LtEq => {
                self.emit_op(Opcode::SetGt)?;
                self.emit_with(Opcode::BrFalse, 1)?;
            }
            _ => {
                self.emit_op(Opcode::SetLt)?;
                self.emit_with(Opcode::BrFalse, 1)?;
            }
        }
        Ok(ty)
    }

    fn analyse_sum(&mut self) -> CompileResult<Type> {
        let ty = self.analyse_term()?;
        loop {
            let opcode = match self.lexer.peek_token()?.kind {
                TokenKind::Punctuator(Punctuator::Plus) => Opcode::AddI,
                TokenKind::Punctuator(Punctuator::Minus) => Opcode::SubI,
                _ => break,
            };
            self.lexer.next_token()?;
            self.analyse_term()?;
            self.emit_op(opcode)?;
        }
        Ok(ty)
    }

    fn analyse_term(&mut self) -> CompileResult<Type> {
        let ty = self.analyse_cast()?;
        loop {
            let opcode = match self.lexer.peek_token()?.kind {
                TokenKind::Punctuator(Punctuator::Star) => Opcode::MulI,
                TokenKind::Punctuator(Punctuator::Slash) => Opcode::DivI,
                _ => break,
            };
            self.lexer.next_token()?;
            self.analyse_cast()?;
            self.emit_op(opcode)?;
        }
        Ok(ty)
    }

    /// `Unary ('as' TYPE)?`; the cast emits nothing and keeps the operand type
    fn analyse_cast(&mut self) -> CompileResult<Type> {
        let ty = self.analyse_unary()?;
        if self.check_keyword(Keyword::As)? {
            self.lexer.next_token()?;
            self.expect_return_type()?;
        }
        Ok(ty)
    }

    fn analyse_unary(&mut self) -> CompileResult<Type> {
        let mut negations = 0;
        while self.check_punct(Punctuator::Minus)? {
            self.lexer.next_token()?;
            negations += 1;
        }
        let ty = self.analyse_primary()?;
        for _ in 0..negations {
            self.emit_op(Opcode::NegI)?;
        }
        Ok(ty)
    }

    fn analyse_primary(&mut self) -> CompileResult<Type> {
        let token = self.lexer.next_token()?;
        match &token.kind {
            TokenKind::Identifier(name) => {
                if self.check_punct(Punctuator::LParen)? {
                    self.analyse_call(name, &token)
                } else if self.check_punct(Punctuator::Assign)? {
                    self.analyse_assignment(name, &token)
                } else {
                    self.analyse_load(name, &token)
                }
            }
            TokenKind::UInt(value) => {
                // Values above i64::MAX keep their bit pattern
                self.emit_with(Opcode::Push, *value as i64)?;
                Ok(Type::Int)
            }
            TokenKind::Char(c) => {
                self.emit_with(Opcode::Push, i64::from(u32::from(*c)))?;
                Ok(Type::Int)
            }
            TokenKind::String(text) => {
                let slot = self.table.declare_string(text);
                self.emit_with(Opcode::Push, i64::from(slot))?;
                Ok(Type::Int)
            }
            // Double arithmetic is not generated; the literal only types the expression
            TokenKind::Double(_) => Ok(Type::Double),
            TokenKind::Punctuator(Punctuator::LParen) => {
                let ty = self.analyse_expr()?;
                self.expect_punct(Punctuator::RParen)?;
                Ok(ty)
            }
            _ => Err(unexpected_token(
                &["identifier", "integer", "double", "string", "char", "'('"],
                &token,
            )),
        }
    }

    /// `IDENT '(' (Expr (',' Expr)*)? ')'`
    fn analyse_call(&mut self, name: &str, name_token: &Token) -> CompileResult<Type> {
        let (index, return_type) = {
            let entry = self.resolve(name, name_token)?;
            match (&entry.category, &entry.function) {
                (SymbolCategory::Function, Some(info)) => (info.index, info.return_type.clone()),
                _ => {
                    return Err(semantic_error(
                        ErrorKind::NotDeclared(name.to_string()),
                        name_token,
                    ))
                }
            }
        };

        self.emit_with(Opcode::StackAlloc, i64::from(return_type.return_slots()))?;
        self.expect_punct(Punctuator::LParen)?;
        if !self.check_punct(Punctuator::RParen)? {
            loop {
                self.analyse_expr()?;
                if !self.check_punct(Punctuator::Comma)? {
                    break;
                }
                self.lexer.next_token()?;
            }
        }
        self.expect_punct(Punctuator::RParen)?;

        if (index as usize) < BUILTIN_COUNT {
            self.emit_with(Opcode::CallName, i64::from(index))?;
        } else {
            self.emit_with(Opcode::Call, i64::from(index - ENTRY_INDEX))?;
        }
        Ok(return_type)
    }

    /// `IDENT '=' Expr`; the assignment itself has type void
    fn analyse_assignment(&mut self, name: &str, name_token: &Token) -> CompileResult<Type> {
        let (id, slot) = {
            let id = self
                .table
                .lookup(name)
                .map_err(|k| semantic_error(k, name_token))?;
            let entry = self.resolve(name, name_token)?;
            if !entry.is_assignable_int() {
                return Err(semantic_error(ErrorKind::InvalidAssignment, name_token));
            }
            if entry.is_constant {
                return Err(semantic_error(
                    ErrorKind::AssignToConstant(name.to_string()),
                    name_token,
                ));
            }
            (id, entry.slot)
        };

        self.expect_punct(Punctuator::Assign)?;
        self.emit_address(slot, name, name_token)?;
        if self.analyse_expr()? == Type::Void {
            return Err(semantic_error(ErrorKind::InvalidAssignment, name_token));
        }
        self.emit_op(Opcode::Store64)?;
        self.table.mark_initialized(id);
        Ok(Type::Void)
    }

    fn analyse_load(&mut self, name: &str, name_token: &Token) -> CompileResult<Type> {
        let (slot, ty) = {
            let entry = self.resolve(name, name_token)?;
            (entry.slot, entry.ty.clone())
        };
        self.emit_address(slot, name, name_token)?;
        self.emit_op(Opcode::Load64)?;
        Ok(ty)
    }

    /// Push the address of a variable slot
    fn emit_address(&mut self, slot: Slot, name: &str, name_token: &Token) -> CompileResult<()> {
        match slot {
            Slot::Arg(index) => {
                let ret_slots = self.current_function_info()?.return_slots();
                self.emit_with(Opcode::Arga, i64::from(index + ret_slots))?;
            }
            Slot::Local(index) => {
                self.emit_with(Opcode::Loca, i64::from(index))?;
            }
            Slot::Global(index) => {
                self.emit_with(Opcode::Globa, i64::from(index))?;
            }
            Slot::Function(_) => {
                return Err(semantic_error(
                    ErrorKind::NotDeclared(name.to_string()),
                    name_token,
                ))
            }
        }
        Ok(())
    }

    // Symbol helpers

    fn resolve(&self, name: &str, token: &Token) -> CompileResult<&SymbolEntry> {
        let id = self
            .table
            .lookup(name)
            .map_err(|k| semantic_error(k, token))?;
        self.table
            .get(id)
            .ok_or_else(|| semantic_error(ErrorKind::NotDeclared(name.to_string()), token))
    }

    fn reserve_local(&mut self, name: &str) -> CompileResult<u32> {
        let info = self.current_function_info_mut()?;
        info.locals.push(name.to_string());
        Ok(info.local_count() - 1)
    }

    fn current_function_info(&self) -> CompileResult<&FunctionInfo> {
        self.table
            .function(self.current_function)
            .map_err(|k| self.internal_error(k))
    }

    fn current_function_info_mut(&mut self) -> CompileResult<&mut FunctionInfo> {
        let position = self.lexer.position();
        self.table
            .function_mut(self.current_function)
            .map_err(|k| CompileError::new(k, position))
    }

    fn current_return_type(&self) -> CompileResult<Type> {
        Ok(self.current_function_info()?.return_type.clone())
    }

    // Emission helpers

    fn emit_op(&mut self, opcode: Opcode) -> CompileResult<usize> {
        self.emit(Instruction::new(opcode))
    }

    fn emit_with(&mut self, opcode: Opcode, operand: i64) -> CompileResult<usize> {
        self.emit(Instruction::with_operand(opcode, operand))
    }

    fn emit(&mut self, inst: Instruction) -> CompileResult<usize> {
        self.table
            .append_instruction(self.current_function, inst)
            .map_err(|k| self.internal_error(k))
    }

    fn emit_placeholder(&mut self, opcode: Opcode) -> CompileResult<PatchSite> {
        self.table
            .emit_placeholder(self.current_function, opcode)
            .map_err(|k| self.internal_error(k))
    }

    fn patch(&mut self, site: PatchSite, operand: i64) -> CompileResult<()> {
        trace!(function = site.function, position = site.position, operand, "patch");
        self.table
            .patch(site, operand)
            .map_err(|k| self.internal_error(k))
    }

    /// Patch a branch so that it lands on instruction `target`
    fn patch_jump(&mut self, site: PatchSite, target: usize) -> CompileResult<()> {
        let offset = target as i64 - (site.position as i64 + 1);
        self.patch(site, offset)
    }

    fn instruction_count(&self) -> CompileResult<usize> {
        self.table
            .instruction_count(self.current_function)
            .map_err(|k| self.internal_error(k))
    }

    fn internal_error(&self, kind: ErrorKind) -> CompileError {
        CompileError::new(kind, self.lexer.position())
    }

    // Token helpers

    fn check_punct(&mut self, p: Punctuator) -> CompileResult<bool> {
        Ok(self.lexer.peek_token()?.is_punct(p))
    }

    fn check_keyword(&mut self, k: Keyword) -> CompileResult<bool> {
        Ok(self.lexer.peek_token()?.is_keyword(k))
    }

    fn expect_punct(&mut self, p: Punctuator) -> CompileResult<Token> {
        let token = self.lexer.next_token()?;
        if token.is_punct(p) {
            return Ok(token);
        }
        let expected = format!("'{}'", p.as_str());
        Err(unexpected_token(&[expected.as_str()], &token))
    }

    fn expect_keyword(&mut self, k: Keyword) -> CompileResult<Token> {
        let token = self.lexer.next_token()?;
        if token.is_keyword(k) {
            return Ok(token);
        }
        let expected = format!("'{}'", k.as_str());
        Err(unexpected_token(&[expected.as_str()], &token))
    }

    fn expect_identifier(&mut self) -> CompileResult<(String, Token)> {
        let token = self.lexer.next_token()?;
        match &token.kind {
            TokenKind::Identifier(name) => Ok((name.clone(), token.clone())),
            _ => Err(unexpected_token(&["identifier"], &token)),
        }
    }

    /// Type of a variable, constant or parameter: `int` or `double`
    fn expect_value_type(&mut self, name_token: &Token) -> CompileResult<Type> {
        let (type_name, _) = self.expect_identifier()?;
        match Type::from_name(&type_name) {
            Some(ty) if ty.is_storable() => Ok(ty),
            _ => Err(semantic_error(ErrorKind::InvalidAssignment, name_token)),
        }
    }

    /// Return or cast type: `int`, `double` or `void`
    fn expect_return_type(&mut self) -> CompileResult<Type> {
        let (type_name, token) = self.expect_identifier()?;
        Type::from_name(&type_name)
            .ok_or_else(|| semantic_error(ErrorKind::UnknownType(type_name), &token))
    }
}
