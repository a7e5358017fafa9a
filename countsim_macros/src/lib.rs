use proc_macro::TokenStream as TokenStream1;
use proc_macro2::TokenStream as TokenStream2;
use quote::{quote, ToTokens};
use syn::{self, Ident};

/// This macro is added before a method of `RoundEngine` in the impl block.
/// Use this macro to first check if the current round phase is exactly the
/// phase in the attribute.
///
/// For example, `#[allowed_phase(Betting)]` will make a method first check
/// if `self.phase` is `GamePhase::Betting`. If not, the method returns
/// `Err(GameError::WrongPhase { .. })` before touching any state. The method
/// must return `Result<_, GameError>`.
#[proc_macro_attribute]
pub fn allowed_phase(attr: TokenStream1, item: TokenStream1) -> TokenStream1 {
    let phase: Ident = match syn::parse(attr) {
        Ok(phase) => phase,
        Err(err) => return err.to_compile_error().into(),
    };
    let mut ast: syn::ImplItemFn = match syn::parse(item) {
        Ok(ast) => ast,
        Err(err) => return err.to_compile_error().into(),
    };
    let operation = ast.sig.ident.to_string();

    let early_return: TokenStream2 = quote! {
        if self.phase != GamePhase::#phase {
            return Err(crate::GameError::WrongPhase {
                operation: #operation,
                expected: GamePhase::#phase,
                actual: self.phase,
            });
        }
    };
    let early_return: syn::Stmt = match syn::parse2(early_return) {
        Ok(stmt) => stmt,
        Err(err) => return err.to_compile_error().into(),
    };
    ast.block.stmts.insert(0, early_return);
    ast.into_token_stream().into()
}
