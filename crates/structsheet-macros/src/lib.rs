use proc_macro::TokenStream;
use proc_macro2::TokenStream as TokenStream2;
use quote::quote;
use syn::{Data, DeriveInput, Fields, LitStr, Type, parse_macro_input, spanned::Spanned};

/* ────────────────────────── the derive macro ───────────────────────── */
/// `#[derive(SheetRecord)]`
///
/// Field attribute: `#[excel("Header,allowempty,expand:date,split:|,font{...}")]`.
/// Fields without it (or tagged `"-"`) are left out of the sheet and only need
/// `Default`. `HashMap<String, V>` / `BTreeMap<String, V>` fields are bound
/// through `CellMap`, everything else through `CellType`.
///
/// Struct attribute: `#[sheet(remarks, gather_header)]` routes the record's
/// `HasRemarks` / `GatherHeader` impls into `SheetRecord`.
#[proc_macro_derive(SheetRecord, attributes(excel, sheet))]
pub fn derive_sheet_record(input: TokenStream) -> TokenStream {
    let input = parse_macro_input!(input as DeriveInput);
    match expand(input) {
        Ok(tokens) => tokens.into(),
        Err(err) => err.to_compile_error().into(),
    }
}

struct FieldPlan {
    ident: syn::Ident,
    name: String,
    tag: Option<String>,
    ty: Type,
    is_map: bool,
}

fn expand(input: DeriveInput) -> syn::Result<TokenStream2> {
    /* -------- 1 · struct-level options -------- */
    let mut remarks = false;
    let mut gather_header = false;
    for attr in input.attrs.iter().filter(|a| a.path().is_ident("sheet")) {
        attr.parse_nested_meta(|meta| {
            if meta.path.is_ident("remarks") {
                remarks = true;
                Ok(())
            } else if meta.path.is_ident("gather_header") {
                gather_header = true;
                Ok(())
            } else {
                Err(meta.error("expected `remarks` or `gather_header`"))
            }
        })?;
    }

    /* -------- 2 · fields -------- */
    let named = match &input.data {
        Data::Struct(data) => match &data.fields {
            Fields::Named(named) => &named.named,
            other => {
                return Err(syn::Error::new(
                    other.span(),
                    "SheetRecord needs a struct with named fields",
                ));
            }
        },
        _ => {
            return Err(syn::Error::new(
                input.ident.span(),
                "SheetRecord can only be derived for structs",
            ));
        }
    };

    let mut plans = Vec::with_capacity(named.len());
    for field in named {
        let Some(ident) = field.ident.clone() else {
            continue;
        };
        let mut tag = None;
        for attr in field.attrs.iter().filter(|a| a.path().is_ident("excel")) {
            if tag.is_some() {
                return Err(syn::Error::new(attr.span(), "duplicate #[excel] attribute"));
            }
            tag = Some(attr.parse_args::<LitStr>()?.value());
        }
        let tag = tag.filter(|t| !t.trim().is_empty() && t.trim() != "-");
        plans.push(FieldPlan {
            name: ident.to_string().trim_start_matches("r#").to_string(),
            ident,
            tag,
            ty: field.ty.clone(),
            is_map: is_map_type(&field.ty),
        });
    }

    /* -------- 3 · schema / accessors -------- */
    let schema = plans.iter().map(|p| {
        let name = &p.name;
        let ty = &p.ty;
        match (&p.tag, p.is_map) {
            (None, _) => quote! { ::structsheet::FieldSchema::skipped(#name) },
            (Some(tag), true) => quote! {
                ::structsheet::FieldSchema::map(
                    #name, #tag, <#ty as ::structsheet::CellMap>::value_kind()
                )
            },
            (Some(tag), false) => quote! {
                ::structsheet::FieldSchema::scalar(
                    #name, #tag, <#ty as ::structsheet::CellType>::kind()
                )
            },
        }
    });

    let bound: Vec<&FieldPlan> = plans.iter().filter(|p| p.tag.is_some()).collect();

    let getters = bound.iter().map(|p| {
        let name = &p.name;
        let ident = &p.ident;
        if p.is_map {
            quote! {
                #name => ::core::option::Option::Some(::structsheet::FieldValue::Map(
                    ::structsheet::CellMap::cell_entries(&self.#ident),
                )),
            }
        } else {
            quote! {
                #name => ::core::option::Option::Some(::structsheet::FieldValue::Scalar(
                    ::structsheet::CellType::to_cell(&self.#ident),
                )),
            }
        }
    });

    let setters = bound.iter().map(|p| {
        let name = &p.name;
        let ident = &p.ident;
        if p.is_map {
            quote! {
                (#name, ::core::option::Option::Some(key)) =>
                    ::structsheet::CellMap::insert_cell(&mut self.#ident, key, value),
            }
        } else {
            quote! {
                (#name, ::core::option::Option::None) => {
                    match ::structsheet::CellType::from_cell(value) {
                        ::core::option::Option::Some(v) => {
                            self.#ident = v;
                            true
                        }
                        ::core::option::Option::None => false,
                    }
                }
            }
        }
    });

    /* -------- 4 · capabilities -------- */
    let remarks_fn = remarks.then(|| {
        quote! {
            fn remarks(&self) -> ::core::option::Option<::structsheet::Remarks> {
                ::core::option::Option::Some(::structsheet::HasRemarks::remarks(self))
            }
        }
    });
    let gather_fn = gather_header.then(|| {
        quote! {
            fn gather_header(&self) -> ::core::option::Option<&dyn ::structsheet::GatherHeader> {
                ::core::option::Option::Some(self)
            }
        }
    });

    /* -------- 5 · assemble -------- */
    let ident = &input.ident;
    let (impl_generics, ty_generics, where_clause) = input.generics.split_for_impl();
    Ok(quote! {
        impl #impl_generics ::structsheet::SheetRecord for #ident #ty_generics #where_clause {
            fn schema() -> ::std::vec::Vec<::structsheet::FieldSchema> {
                ::std::vec![ #(#schema),* ]
            }

            #[allow(unreachable_patterns)]
            fn field_value(&self, field: &str) -> ::core::option::Option<::structsheet::FieldValue> {
                match field {
                    #(#getters)*
                    _ => ::core::option::Option::None,
                }
            }

            #[allow(unreachable_patterns, unused_variables)]
            fn set_field(
                &mut self,
                field: &str,
                key: ::core::option::Option<&str>,
                value: ::structsheet::CellValue,
            ) -> bool {
                match (field, key) {
                    #(#setters)*
                    _ => false,
                }
            }

            #remarks_fn
            #gather_fn
        }
    })
}

/// `HashMap<..>` / `BTreeMap<..>` by last path segment, so aliases through
/// `std::collections::` or a custom hasher still count.
fn is_map_type(ty: &Type) -> bool {
    match ty {
        Type::Path(path) => path
            .path
            .segments
            .last()
            .is_some_and(|seg| seg.ident == "HashMap" || seg.ident == "BTreeMap"),
        _ => false,
    }
}
