use proc_macro2::TokenStream as TokenStream2;
use quote::quote;
use syn::Attribute;

/// Parsed `#[fory(...)]` annotations for one field.
#[derive(Default)]
pub(crate) struct FieldAttrs {
    pub ignore: bool,
    pub nullable: bool,
    pub track_ref: bool,
    pub compress: bool,
    pub tag_id: Option<i32>,
    pub encoding: Option<String>,
}

pub(crate) fn parse_field_attrs(attrs: &[Attribute]) -> syn::Result<FieldAttrs> {
    let mut out = FieldAttrs::default();
    for attr in attrs {
        if !attr.path().is_ident("fory") {
            continue;
        }
        attr.parse_nested_meta(|meta| {
            if meta.path.is_ident("ignore") {
                out.ignore = true;
                Ok(())
            } else if meta.path.is_ident("nullable") {
                out.nullable = true;
                Ok(())
            } else if meta.path.is_ident("track_ref") {
                out.track_ref = true;
                Ok(())
            } else if meta.path.is_ident("compress") {
                out.compress = true;
                Ok(())
            } else if meta.path.is_ident("id") {
                let lit: syn::LitInt = meta.value()?.parse()?;
                out.tag_id = Some(lit.base10_parse()?);
                Ok(())
            } else if meta.path.is_ident("encoding") {
                let lit: syn::LitStr = meta.value()?.parse()?;
                out.encoding = Some(lit.value());
                Ok(())
            } else {
                Err(meta.error("unknown fory attribute"))
            }
        })?;
    }
    Ok(out)
}

impl FieldAttrs {
    /// Tokens constructing the matching `fory::FieldOverrides` value.
    pub(crate) fn overrides_tokens(&self) -> syn::Result<TokenStream2> {
        let nullable = self.nullable;
        let track = self.track_ref;
        let compress = self.compress;
        let tag_id = self.tag_id.unwrap_or(-1);
        let encoding = match self.encoding.as_deref() {
            None => quote! { None },
            Some("fixed") => quote! { Some(fory::IntEncoding::Fixed) },
            Some("varint") => quote! { Some(fory::IntEncoding::Varint) },
            Some("tagged") => quote! { Some(fory::IntEncoding::Tagged) },
            Some(other) => {
                return Err(syn::Error::new(
                    proc_macro2::Span::call_site(),
                    format!("unknown encoding {other:?}; expected fixed, varint, or tagged"),
                ))
            }
        };
        Ok(quote! {
            fory::FieldOverrides {
                nullable: #nullable,
                track: #track,
                tag_id: #tag_id,
                compress: #compress,
                encoding: #encoding,
            }
        })
    }
}
