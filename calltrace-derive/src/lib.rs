use quote::quote;
use syn::{parse_macro_input, Item, LitStr};

/// Marks a type as part of an event payload. Payload types are plain data and
/// all share the same set of derives so they can be compared in tests and
/// marshaled to the control channel.
#[proc_macro_attribute]
pub fn event_type(
    _args: proc_macro::TokenStream,
    item: proc_macro::TokenStream,
) -> proc_macro::TokenStream {
    let input: Item = parse_macro_input!(item);
    match input {
        Item::Struct(_) | Item::Enum(_) => (),
        _ => panic!("event types must be enums or structs"),
    }

    let output = quote! {
        #[derive(Clone, Debug, PartialEq, serde::Serialize, serde::Deserialize)]
        #input
    };
    output.into()
}

/// Marks a struct as the payload of a named outbound event, e.g.
/// `#[event_payload("thread:summary")]`.
#[proc_macro_attribute]
pub fn event_payload(
    args: proc_macro::TokenStream,
    item: proc_macro::TokenStream,
) -> proc_macro::TokenStream {
    let input: Item = parse_macro_input!(item);
    let ident = match input {
        Item::Struct(ref item) => item.ident.clone(),
        _ => panic!("event payloads must be structs"),
    };

    let name: LitStr = syn::parse(args).expect("Invalid event name");

    let output = quote! {
        #[crate::event_type]
        #input

        impl EventPayload for #ident {
            const NAME: &'static str = #name;

            fn to_json(&self) -> serde_json::Value {
                serde_json::json!(self)
            }
        }
    };
    output.into()
}
