use proc_macro::TokenStream;
use quote::quote;
use syn::{parse_macro_input, Data, DeriveInput, Fields, Lit, LitInt, Meta, Type};

/// Derive macro that generates CSV template documentation from struct fields.
///
/// For each field, extracts:
/// - Column name (respects #[serde(rename = "...")])
/// - Required (true if not Option<T>)
/// - Description (from doc comments)
///
/// Generates a `csv_schema() -> &'static [CsvField]` method. `CsvField` must be
/// in scope where the derive is used.
#[proc_macro_derive(CsvSchema, attributes(serde))]
pub fn derive_csv_schema(input: TokenStream) -> TokenStream {
    let input = parse_macro_input!(input as DeriveInput);
    let name = &input.ident;

    let fields = match named_fields(&input, "CsvSchema") {
        Ok(fields) => fields,
        Err(err) => return err.to_compile_error().into(),
    };

    let field_entries = fields.iter().map(|field| {
        let field_name = field
            .ident
            .as_ref()
            .map(|i| i.to_string())
            .unwrap_or_default();
        let csv_name = get_serde_rename(&field.attrs).unwrap_or(field_name);
        let required = !is_option_type(&field.ty);
        let doc = get_doc_comment(&field.attrs);
        quote! {
            CsvField {
                name: #csv_name,
                required: #required,
                description: #doc,
            }
        }
    });

    let expanded = quote! {
        impl #name {
            pub fn csv_schema() -> &'static [CsvField] {
                static SCHEMA: &[CsvField] = &[
                    #(#field_entries),*
                ];
                SCHEMA
            }
        }
    };

    TokenStream::from(expanded)
}

/// Derive macro implementing `RoundFields` for a record.
///
/// Fields annotated with `#[round(dp = N)]` are rounded half away from zero to
/// `N` decimal places; both `Decimal` and `Option<Decimal>` are supported.
/// Fields annotated with `#[round(nested)]` delegate to their own
/// `round_fields`. `RoundFields` must be in scope where the derive is used.
#[proc_macro_derive(RoundFields, attributes(round))]
pub fn derive_round_fields(input: TokenStream) -> TokenStream {
    let input = parse_macro_input!(input as DeriveInput);
    let name = &input.ident;

    let fields = match named_fields(&input, "RoundFields") {
        Ok(fields) => fields,
        Err(err) => return err.to_compile_error().into(),
    };

    let mut statements = Vec::new();
    for field in fields.iter() {
        let ident = match &field.ident {
            Some(ident) => ident,
            None => continue,
        };
        let spec = match get_round_spec(&field.attrs) {
            Ok(Some(spec)) => spec,
            Ok(None) => continue,
            Err(err) => return err.to_compile_error().into(),
        };
        let statement = match spec {
            RoundSpec::Nested => quote! {
                self.#ident.round_fields();
            },
            RoundSpec::Places(dp) if is_option_type(&field.ty) => quote! {
                if let Some(value) = self.#ident.as_mut() {
                    *value = value.round_dp_with_strategy(
                        #dp,
                        ::rust_decimal::RoundingStrategy::MidpointAwayFromZero,
                    );
                    value.rescale(#dp);
                }
            },
            RoundSpec::Places(dp) => quote! {
                self.#ident = self.#ident.round_dp_with_strategy(
                    #dp,
                    ::rust_decimal::RoundingStrategy::MidpointAwayFromZero,
                );
                self.#ident.rescale(#dp);
            },
        };
        statements.push(statement);
    }

    let expanded = quote! {
        impl RoundFields for #name {
            fn round_fields(&mut self) {
                #(#statements)*
            }
        }
    };

    TokenStream::from(expanded)
}

enum RoundSpec {
    Places(u32),
    Nested,
}

fn named_fields<'a>(
    input: &'a DeriveInput,
    derive: &str,
) -> syn::Result<&'a syn::punctuated::Punctuated<syn::Field, syn::token::Comma>> {
    match &input.data {
        Data::Struct(data) => match &data.fields {
            Fields::Named(fields) => Ok(&fields.named),
            _ => Err(syn::Error::new_spanned(
                &input.ident,
                format!("{derive} only supports structs with named fields"),
            )),
        },
        _ => Err(syn::Error::new_spanned(
            &input.ident,
            format!("{derive} only supports structs"),
        )),
    }
}

fn get_round_spec(attrs: &[syn::Attribute]) -> syn::Result<Option<RoundSpec>> {
    let mut spec = None;
    for attr in attrs {
        if !attr.path().is_ident("round") {
            continue;
        }
        attr.parse_nested_meta(|meta| {
            if meta.path.is_ident("dp") {
                let lit: LitInt = meta.value()?.parse()?;
                spec = Some(RoundSpec::Places(lit.base10_parse()?));
                Ok(())
            } else if meta.path.is_ident("nested") {
                spec = Some(RoundSpec::Nested);
                Ok(())
            } else {
                Err(meta.error("expected `dp = N` or `nested`"))
            }
        })?;
    }
    Ok(spec)
}

fn get_serde_rename(attrs: &[syn::Attribute]) -> Option<String> {
    for attr in attrs {
        if !attr.path().is_ident("serde") {
            continue;
        }

        if let Meta::List(meta_list) = &attr.meta {
            let tokens = meta_list.tokens.to_string();
            // Simple parsing: look for rename = "..."
            if let Some(start) = tokens.find("rename") {
                let rest = &tokens[start..];
                if let Some(eq_pos) = rest.find('=') {
                    let after_eq = rest[eq_pos + 1..].trim();
                    if let Some(stripped) = after_eq.strip_prefix('"') {
                        if let Some(end_quote) = stripped.find('"') {
                            return Some(stripped[..end_quote].to_string());
                        }
                    }
                }
            }
        }
    }
    None
}

fn get_doc_comment(attrs: &[syn::Attribute]) -> String {
    attrs
        .iter()
        .filter_map(|attr| {
            if !attr.path().is_ident("doc") {
                return None;
            }
            if let Meta::NameValue(meta) = &attr.meta {
                if let syn::Expr::Lit(expr_lit) = &meta.value {
                    if let Lit::Str(lit_str) = &expr_lit.lit {
                        return Some(lit_str.value().trim().to_string());
                    }
                }
            }
            None
        })
        .collect::<Vec<_>>()
        .join(" ")
}

fn is_option_type(ty: &Type) -> bool {
    if let Type::Path(type_path) = ty {
        if let Some(segment) = type_path.path.segments.last() {
            return segment.ident == "Option";
        }
    }
    false
}
