use proc_macro::TokenStream;
use proc_macro2::{Span, TokenStream as TokenStream2};
use quote::quote;
use syn::{parse_macro_input, FnArg, Ident, ItemFn, ReturnType};

/// Turns a render function into a component constructor.
///
/// ```ignore
/// #[component]
/// fn badge(props: &Props, children: &[VNode]) -> VNode { .. }
/// ```
///
/// becomes `fn badge(props: Props, children: Vec<VNode>) -> VNode`, which
/// returns an unresolved component node named `badge`. The body runs when
/// the tree is normalized, not when the constructor is called.
#[proc_macro_attribute]
pub fn component(attr: TokenStream, item: TokenStream) -> TokenStream {
    let attr_tokens = TokenStream2::from(attr);
    if !attr_tokens.is_empty() {
        return syn::Error::new_spanned(attr_tokens, "component takes no arguments")
            .to_compile_error()
            .into();
    }

    let func = parse_macro_input!(item as ItemFn);
    match expand_component(func) {
        Ok(tokens) => tokens.into(),
        Err(err) => err.to_compile_error().into(),
    }
}

fn expand_component(func: ItemFn) -> syn::Result<TokenStream2> {
    let sig = &func.sig;
    if !sig.generics.params.is_empty() {
        return Err(syn::Error::new_spanned(
            &sig.generics,
            "components cannot be generic",
        ));
    }
    if sig.asyncness.is_some() {
        return Err(syn::Error::new_spanned(
            sig.asyncness,
            "components must be synchronous",
        ));
    }
    if sig.inputs.len() != 2 {
        return Err(syn::Error::new_spanned(
            &sig.inputs,
            "components take exactly two arguments: `props: &Props, children: &[VNode]`",
        ));
    }
    for input in &sig.inputs {
        if let FnArg::Receiver(receiver) = input {
            return Err(syn::Error::new_spanned(
                receiver,
                "components cannot take `self`",
            ));
        }
    }
    if let ReturnType::Default = sig.output {
        return Err(syn::Error::new_spanned(
            &sig.ident,
            "components must return a `VNode`",
        ));
    }

    let attrs = &func.attrs;
    let vis = &func.vis;
    let name = &sig.ident;
    let name_str = name.to_string();
    let inputs = &sig.inputs;
    let output = &sig.output;
    let block = &func.block;
    let render_ident = Ident::new(&format!("__render_{name}"), Span::call_site());

    Ok(quote! {
        #(#attrs)*
        #vis fn #name(
            props: ::vdom_core::Props,
            children: ::std::vec::Vec<::vdom_core::VNode>,
        ) -> ::vdom_core::VNode {
            fn #render_ident(#inputs) #output #block

            ::vdom_core::VNode::component(
                ::vdom_core::Component::new(#name_str, #render_ident),
                props,
                children,
            )
        }
    })
}
