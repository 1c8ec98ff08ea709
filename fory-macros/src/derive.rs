use proc_macro::TokenStream;
use proc_macro2::TokenStream as TokenStream2;
use quote::quote;
use syn::{parse_macro_input, Data, DataEnum, DataStruct, DeriveInput, Fields, Ident};

use crate::attr::parse_field_attrs;

pub(crate) fn derive(input: TokenStream) -> TokenStream {
    let input = parse_macro_input!(input as DeriveInput);
    match expand(&input) {
        Ok(tokens) => tokens.into(),
        Err(err) => err.to_compile_error().into(),
    }
}

fn expand(input: &DeriveInput) -> syn::Result<TokenStream2> {
    if input.generics.params.iter().next().is_some() {
        return Err(syn::Error::new_spanned(
            &input.generics,
            "ForyObject does not support generic types; registration is per concrete type",
        ));
    }
    match &input.data {
        Data::Struct(data) => expand_struct(input, data),
        Data::Enum(data) => expand_enum(input, data),
        Data::Union(_) => Err(syn::Error::new_spanned(
            &input.ident,
            "ForyObject cannot be derived for untagged unions",
        )),
    }
}

/// Shared `Serializer` plumbing: type info through the registry, body codec
/// through the given data expressions.
fn serializer_impl(
    name: &Ident,
    name_str: &str,
    field_type: TokenStream2,
    is_struct: bool,
    write_data: TokenStream2,
    read_data: TokenStream2,
) -> TokenStream2 {
    quote! {
        impl fory::Serializer for #name {
            fn fory_type_id(fory: &fory::Fory) -> u32 {
                fory.type_resolver()
                    .expect_info(std::any::TypeId::of::<Self>(), #name_str)
                    .type_id
            }

            fn fory_field_type(fory: &fory::Fory) -> fory::meta::FieldType {
                let _ = fory;
                #field_type
            }

            fn fory_is_struct() -> bool {
                #is_struct
            }

            fn fory_reserved_space() -> usize {
                32
            }

            fn fory_write_data(&self, context: &mut fory::resolver::context::WriteContext) {
                #write_data
            }

            fn fory_write_type_info(context: &mut fory::resolver::context::WriteContext) {
                fory::serializer::struct_::write_registered_type_info::<Self>(context);
            }

            fn fory_read_data(
                context: &mut fory::resolver::context::ReadContext,
            ) -> ::std::result::Result<Self, fory::Error> {
                #read_data
            }

            fn fory_read_type_info(
                context: &mut fory::resolver::context::ReadContext,
            ) -> ::std::result::Result<(), fory::Error> {
                fory::serializer::struct_::read_registered_type_info::<Self>(context)
            }
        }
    }
}

fn expand_struct(input: &DeriveInput, data: &DataStruct) -> syn::Result<TokenStream2> {
    let Fields::Named(fields) = &data.fields else {
        return Err(syn::Error::new_spanned(
            &input.ident,
            "ForyObject structs require named fields",
        ));
    };
    let name = &input.ident;
    let name_str = name.to_string();

    let mut descriptor_entries = Vec::new();
    let mut default_fields = Vec::new();
    for field in &fields.named {
        let ident = field.ident.as_ref().unwrap();
        let ty = &field.ty;
        let attrs = parse_field_attrs(&field.attrs)?;
        default_fields.push(quote! {
            #ident: <#ty as fory::ForyDefault>::fory_default()
        });
        if attrs.ignore {
            continue;
        }
        let overrides = attrs.overrides_tokens()?;
        let field_name = ident.to_string();
        descriptor_entries.push(quote! {
            fory::FieldDescriptor::of::<#ty>(
                fory,
                #field_name,
                core::mem::offset_of!(#name, #ident),
                #overrides,
            )
        });
    }

    let serializer = serializer_impl(
        name,
        &name_str,
        quote! { fory::meta::FieldType::new(fory::types::STRUCT) },
        true,
        quote! { fory::serializer::struct_::write_struct_data(self, context); },
        quote! { fory::serializer::struct_::read_struct_data::<Self>(context) },
    );

    Ok(quote! {
        impl fory::ForyDefault for #name {
            fn fory_default() -> Self {
                #name {
                    #(#default_fields,)*
                }
            }
        }

        impl fory::ForyStruct for #name {
            fn fory_fields(fory: &fory::Fory) -> Vec<fory::FieldDescriptor> {
                vec![
                    #(#descriptor_entries,)*
                ]
            }

            fn fory_type_name() -> &'static str {
                #name_str
            }
        }

        #serializer
    })
}

fn expand_enum(input: &DeriveInput, data: &DataEnum) -> syn::Result<TokenStream2> {
    if data.variants.is_empty() {
        return Err(syn::Error::new_spanned(
            &input.ident,
            "ForyObject cannot be derived for empty enums",
        ));
    }
    let is_union = data
        .variants
        .iter()
        .any(|v| !matches!(v.fields, Fields::Unit));
    if is_union {
        expand_union(input, data)
    } else {
        expand_unit_enum(input, data)
    }
}

fn expand_unit_enum(input: &DeriveInput, data: &DataEnum) -> syn::Result<TokenStream2> {
    let name = &input.ident;
    let name_str = name.to_string();
    let idents: Vec<&Ident> = data.variants.iter().map(|v| &v.ident).collect();
    let ordinals: Vec<u32> = (0..idents.len() as u32).collect();
    let first = idents[0];

    let serializer = serializer_impl(
        name,
        &name_str,
        quote! { fory::meta::FieldType::new(fory::types::ENUM) },
        false,
        quote! {
            let ordinal = match self {
                #(Self::#idents => #ordinals,)*
            };
            fory::serializer::union::write_enum_ordinal(context, ordinal);
        },
        quote! {
            let ordinal = fory::serializer::union::read_enum_ordinal(context)?;
            Ok(match ordinal {
                #(#ordinals => Self::#idents,)*
                other => {
                    fory::serializer::union::report_unknown_ordinal(#name_str, other);
                    <Self as fory::ForyDefault>::fory_default()
                }
            })
        },
    );

    Ok(quote! {
        impl fory::ForyDefault for #name {
            fn fory_default() -> Self {
                Self::#first
            }
        }

        impl fory::ForyStruct for #name {
            fn fory_fields(_fory: &fory::Fory) -> Vec<fory::FieldDescriptor> {
                Vec::new()
            }

            fn fory_type_name() -> &'static str {
                #name_str
            }

            fn fory_kind() -> fory::TypeKind {
                fory::TypeKind::Enum
            }
        }

        #serializer
    })
}

fn expand_union(input: &DeriveInput, data: &DataEnum) -> syn::Result<TokenStream2> {
    let name = &input.ident;
    let name_str = name.to_string();
    let arm_count = data.variants.len() as u32;

    let mut arm_types = Vec::new();
    let mut write_arms = Vec::new();
    let mut read_arms = Vec::new();
    let mut default_arm = None;
    for (index, variant) in data.variants.iter().enumerate() {
        let index = index as u32;
        let ident = &variant.ident;
        match &variant.fields {
            Fields::Unit => {
                arm_types.push(quote! { fory::meta::FieldType::new(fory::types::NONE) });
                write_arms.push(quote! {
                    Self::#ident => {
                        fory::serializer::union::write_union_index(context, #index);
                    }
                });
                read_arms.push(quote! {
                    #index => Self::#ident,
                });
                if default_arm.is_none() {
                    default_arm = Some(quote! { Self::#ident });
                }
            }
            Fields::Unnamed(fields) if fields.unnamed.len() == 1 => {
                let ty = &fields.unnamed[0].ty;
                arm_types.push(quote! { <#ty as fory::Serializer>::fory_field_type(fory) });
                write_arms.push(quote! {
                    Self::#ident(value) => {
                        fory::serializer::union::write_union_index(context, #index);
                        if fory::serializer::union::arm_writes_type_info::<#ty>(context.fory()) {
                            <#ty as fory::Serializer>::fory_write_type_info(context);
                        }
                        <#ty as fory::Serializer>::fory_write_data(value, context);
                    }
                });
                read_arms.push(quote! {
                    #index => {
                        if fory::serializer::union::arm_writes_type_info::<#ty>(context.fory()) {
                            <#ty as fory::Serializer>::fory_read_type_info(context)?;
                        }
                        Self::#ident(<#ty as fory::Serializer>::fory_read_data(context)?)
                    }
                });
                if default_arm.is_none() {
                    default_arm = Some(quote! {
                        Self::#ident(<#ty as fory::ForyDefault>::fory_default())
                    });
                }
            }
            _ => {
                return Err(syn::Error::new_spanned(
                    ident,
                    "union variants must be unit or hold exactly one unnamed field",
                ));
            }
        }
    }
    let default_arm = default_arm.unwrap();

    let serializer = serializer_impl(
        name,
        &name_str,
        quote! {
            fory::meta::FieldType::with_generics(
                fory::types::UNION,
                vec![ #(#arm_types,)* ],
            )
        },
        false,
        quote! {
            match self {
                #(#write_arms)*
            }
        },
        quote! {
            let index = fory::serializer::union::read_union_index(context, #arm_count, #name_str)?;
            Ok(match index {
                #(#read_arms)*
                _ => unreachable!(),
            })
        },
    );

    Ok(quote! {
        impl fory::ForyDefault for #name {
            fn fory_default() -> Self {
                #default_arm
            }
        }

        impl fory::ForyStruct for #name {
            fn fory_fields(_fory: &fory::Fory) -> Vec<fory::FieldDescriptor> {
                Vec::new()
            }

            fn fory_type_name() -> &'static str {
                #name_str
            }

            fn fory_kind() -> fory::TypeKind {
                fory::TypeKind::Union
            }
        }

        #serializer
    })
}
