// Copyright (c) 2025 Joshua Seaton
//
// Use of this source code is governed by a MIT-style
// license that can be found in the LICENSE file or at
// https://opensource.org/licenses/MIT#

use proc_macro::TokenStream;
use proc_macro2::{Literal, Span, TokenStream as TokenStream2};
use quote::{ToTokens, format_ident, quote};
use syn::parse::{Error, Parse, ParseStream, Result};
use syn::spanned::Spanned;
use syn::{
    Expr, ExprLit, Fields, GenericArgument, Ident, ItemStruct, Lit,
    Pat, Path, PathArguments, Stmt, Type, braced, parse_macro_input,
    parse_quote,
};

#[proc_macro_attribute]
pub fn bitfield_repr(attr: TokenStream, item: TokenStream) -> TokenStream {
    let raw = parse_macro_input!(attr as Ident);
    let item = parse_macro_input!(item as syn::ItemEnum);
    if !["u8", "u16", "u32", "u64", "u128"].iter().any(|ty| raw == *ty) {
        return Error::new_spanned(
            raw,
            "representation must be an unsigned integral type",
        )
        .to_compile_error()
        .into();
    }

    let name = &item.ident;
    quote! {
        #[repr(#raw)]
        #[derive(
            Clone,
            Copy,
            Debug,
            Eq,
            PartialEq,
            ::zerocopy::Immutable,
            ::zerocopy::IntoBytes,
            ::zerocopy::TryFromBytes,
        )]
        #item

        impl<W: ::bitview::Word> ::bitview::FieldValue<W> for #name
        where
            #raw: ::bitview::FieldValue<W, Output = #raw>,
        {
            type Output = ::core::result::Result<Self, ::bitview::InvalidBits<#raw>>;

            #[inline]
            fn from_field(
                bits: W,
                location: &::bitview::FieldLocation,
            ) -> Self::Output {
                use ::zerocopy::IntoBytes;
                use ::zerocopy::TryFromBytes;
                let raw = <#raw as ::bitview::FieldValue<W>>::from_field(bits, location);
                Self::try_read_from_bytes(raw.as_bytes())
                    .map_err(|_| ::bitview::InvalidBits(raw))
            }

            #[inline]
            fn into_field(self) -> W {
                <#raw as ::bitview::FieldValue<W>>::into_field(self as #raw)
            }
        }
    }
    .into()
}

#[proc_macro]
pub fn layout(item: TokenStream) -> TokenStream {
    parse_macro_input!(item as Bitfields)
        .to_token_stream()
        .into()
}

//
// Access policies.
//

#[derive(Clone, Copy, PartialEq)]
enum Policy {
    NoAccess,
    Ro,
    Wo,
    Rw,
    Rew,
}

impl Policy {
    fn from_ident(ident: &Ident) -> Option<Self> {
        Some(match ident.to_string().as_str() {
            "NoAccess" => Self::NoAccess,
            "Ro" => Self::Ro,
            "Wo" => Self::Wo,
            "Rw" => Self::Rw,
            "Rew" => Self::Rew,
            _ => return None,
        })
    }

    fn from_type(ty: &Type) -> Option<Self> {
        let Type::Path(path_ty) = ty else {
            return None;
        };
        if path_ty.qself.is_some() {
            return None;
        }
        Self::from_ident(path_ty.path.get_ident()?)
    }

    const fn is_readable(self) -> bool {
        matches!(self, Self::Ro | Self::Rw | Self::Rew)
    }

    const fn is_writable(self) -> bool {
        matches!(self, Self::Wo | Self::Rw | Self::Rew)
    }

    // Whether every right of `self` is also granted by `other`.
    const fn within(self, other: Self) -> bool {
        (!self.is_readable() || other.is_readable())
            && (!self.is_writable() || other.is_writable())
    }

    const fn is_readwrite(self) -> bool {
        matches!(self, Self::Rw | Self::Rew)
    }
}

impl ToTokens for Policy {
    fn to_tokens(&self, tokens: &mut TokenStream2) {
        match self {
            Self::NoAccess => quote! { ::bitview::NoAccess },
            Self::Ro => quote! { ::bitview::Ro },
            Self::Wo => quote! { ::bitview::Wo },
            Self::Rw => quote! { ::bitview::Rw },
            Self::Rew => quote! { ::bitview::Rew },
        }
        .to_tokens(tokens);
    }
}

//
// Parsing of the layout type.
//

enum BaseType {
    U8,
    U16,
    U32,
    U64,
    U128,
    Usize,
    Storage,
}

impl BaseType {
    const fn high_bit(&self) -> Option<usize> {
        match *self {
            Self::U8 => Some(7),
            Self::U16 => Some(15),
            Self::U32 => Some(31),
            Self::U64 => Some(63),
            Self::U128 => Some(127),
            Self::Usize | Self::Storage => None,
        }
    }
}

struct BaseTypeDef {
    // The storage type of the register: `Plain<$int>` for a bare integer.
    storage: TokenStream2,
    ty: BaseType,
}

impl TryFrom<Type> for BaseTypeDef {
    type Error = Error;

    fn try_from(type_def: Type) -> Result<Self> {
        const INVALID_BASE_TYPE: &str = "base type must be an unsigned \
            integral type or a path to a `bitview::Storage` type";
        let Type::Path(ref path_ty) = type_def else {
            return Err(Error::new_spanned(type_def, INVALID_BASE_TYPE));
        };
        let path = &path_ty.path;
        let ty = if path.is_ident("u8") {
            BaseType::U8
        } else if path.is_ident("u16") {
            BaseType::U16
        } else if path.is_ident("u32") {
            BaseType::U32
        } else if path.is_ident("u64") {
            BaseType::U64
        } else if path.is_ident("u128") {
            BaseType::U128
        } else if path.is_ident("usize") {
            BaseType::Usize
        } else {
            return Ok(Self {
                storage: type_def.to_token_stream(),
                ty: BaseType::Storage,
            });
        };
        Ok(Self {
            storage: quote! { ::bitview::Plain<#type_def> },
            ty,
        })
    }
}

struct TypeDef {
    def: ItemStruct,
    base: BaseTypeDef,
    access: Policy,
    engine: TokenStream2,
}

impl Parse for TypeDef {
    fn parse(input: ParseStream) -> Result<Self> {
        let mut strct: ItemStruct = input.parse()?;

        let mut access = Policy::Rw;
        let mut engine = None;
        let mut attrs = Vec::with_capacity(strct.attrs.len());
        for attr in strct.attrs.drain(..) {
            if attr.path().is_ident("access") {
                let ident: Ident = attr.parse_args()?;
                access = Policy::from_ident(&ident).ok_or_else(|| {
                    Error::new_spanned(
                        &ident,
                        "expected one of `Ro`, `Wo`, `Rw`, `Rew` or `NoAccess`",
                    )
                })?;
                continue;
            }
            if attr.path().is_ident("engine") {
                engine = Some(attr.parse_args::<Path>()?);
                continue;
            }
            if attr.path().is_ident("repr") {
                return Err(Error::new_spanned(
                    attr,
                    "layout! types are always repr(transparent)",
                ));
            }
            if attr.path().is_ident("derive") {
                attr.parse_nested_meta(|meta| {
                    for t in &["Clone", "Copy", "Debug"] {
                        if meta.path.is_ident(t) {
                            return Err(Error::new_spanned(
                                meta.path,
                                format!("layout! already implements {t} where permitted"),
                            ));
                        }
                    }
                    Ok(())
                })?;
            }
            attrs.push(attr);
        }
        attrs.push(parse_quote!(#[repr(transparent)]));
        strct.attrs = attrs;

        let base = if let Fields::Unnamed(fields) = &strct.fields {
            let mut unnamed = fields.unnamed.iter();
            let (Some(field), None) = (unnamed.next(), unnamed.next()) else {
                return Err(Error::new_spanned(
                    &fields.unnamed,
                    "exactly one tuple field, the base type, should be provided",
                ));
            };
            BaseTypeDef::try_from(field.ty.clone())?
        } else {
            return Err(Error::new_spanned(
                &strct.fields,
                "layout type must be defined as a tuple struct",
            ));
        };

        if !strct.generics.params.is_empty() {
            return Err(Error::new_spanned(
                &strct.generics,
                "generic layout types are not supported",
            ));
        }

        let engine = engine.map_or_else(
            || quote! { ::bitview::Generic },
            |path| path.to_token_stream(),
        );

        Ok(Self {
            def: strct,
            base,
            access,
            engine,
        })
    }
}

//
// Parsing and binding for an individual bitfield.
//

enum Kind {
    // A single field.
    Field,
    // A field set of `count` items of `size` bits each.
    Set { size: usize, count: usize },
}

struct Bitfield {
    span: Span,
    name: Ident,
    kind: Kind,
    high_bit: usize,
    low_bit: usize,
    value: Option<Type>,
    access: Option<Policy>,
}

impl Bitfield {
    const fn bit_width(&self) -> usize {
        match self.kind {
            Kind::Field => self.high_bit - self.low_bit + 1,
            Kind::Set { size, .. } => size,
        }
    }

    const fn item_count(&self) -> usize {
        match self.kind {
            Kind::Field => 1,
            Kind::Set { count, .. } => count,
        }
    }

    fn access(&self, ty: &TypeDef) -> Policy {
        self.access.unwrap_or(ty.access)
    }

    fn value_type(&self) -> TokenStream2 {
        if let Some(value) = &self.value {
            return value.to_token_stream();
        }
        match self.bit_width() {
            1 => quote! {bool},
            2..=8 => quote! {u8},
            9..=16 => quote! {u16},
            17..=32 => quote! {u32},
            33..=64 => quote! {u64},
            65..=128 => quote! {u128},
            width => panic!("unexpected integral bit width: {width}"),
        }
    }

    fn display_range(&self) -> String {
        match self.kind {
            Kind::Field if self.high_bit == self.low_bit => {
                format!("bit {}", self.low_bit)
            }
            Kind::Field => format!("[{}:{}]", self.high_bit, self.low_bit),
            Kind::Set { size, count } => format!(
                "[{}:{}] ({count} items of {size} bits)",
                self.high_bit, self.low_bit
            ),
        }
    }

    fn accessor(&self, ty: &TypeDef) -> TokenStream2 {
        let name = &self.name;
        let storage = &ty.base.storage;
        let engine = &ty.engine;
        let access = self.access(ty);
        let reg_access = &ty.access;
        let value = self.value_type();
        let low_bit = Literal::usize_unsuffixed(self.low_bit);
        let high_bit = Literal::usize_unsuffixed(self.high_bit);
        let doc = format!(
            "The `{name}` {} (i.e., `{}{}`).",
            match self.kind {
                Kind::Field => "field",
                Kind::Set { .. } => "field set",
            },
            ty.def.ident,
            self.display_range(),
        );

        match self.kind {
            Kind::Field => {
                let location = if self.high_bit == self.low_bit {
                    quote! { ::bitview::Bit<#low_bit> }
                } else {
                    quote! { ::bitview::Span<#low_bit, #high_bit> }
                };
                quote! {
                    #[doc = #doc]
                    #[inline]
                    #[must_use]
                    pub fn #name(&self) -> ::bitview::Field<'_, #storage, #location, #value, #access, #reg_access, #engine> {
                        self.0.field()
                    }
                }
            }
            Kind::Set { size, count } => {
                let size = Literal::usize_unsuffixed(size);
                let count = Literal::usize_unsuffixed(count);
                quote! {
                    #[doc = #doc]
                    #[inline]
                    #[must_use]
                    pub fn #name(&self) -> ::bitview::FieldSet<'_, #storage, ::bitview::Items<#size, #count, #low_bit>, #value, #access, #reg_access, #engine> {
                        self.0.field_set()
                    }
                }
            }
        }
    }
}

impl Parse for Bitfield {
    fn parse(input: ParseStream) -> Result<Self> {
        const INVALID_BITFIELD_DECL_FORM: &str = "bitfield declaration should take one of the following forms:\n\
            * `let $name: Bit<$bit (, $value)? (, $access)?>;`\n\
            * `let $name: Bits<$high, $low (, $value)? (, $access)?>;`\n\
            * `let $name: BitSet<$size, $count (, $offset)? (, $value)? (, $access)?>;`";
        let err = |spanned: &dyn ToTokens| {
            Error::new_spanned(spanned, INVALID_BITFIELD_DECL_FORM)
        };

        let stmt = input.parse::<Stmt>()?;
        let Stmt::Local(ref local) = stmt else {
            return Err(err(&stmt));
        };

        if let Some(attr) = local.attrs.first() {
            return Err(Error::new_spanned(
                attr,
                "attributes are not permitted on individual fields",
            ));
        }
        if let Some(init) = &local.init {
            return Err(Error::new_spanned(
                &init.expr,
                "fields cannot be initialized in the layout",
            ));
        }

        let Pat::Type(ref pat_type) = local.pat else {
            return Err(err(&local));
        };

        let name = match *pat_type.pat {
            Pat::Ident(ref pat_ident) => {
                if let Some(by_ref) = &pat_ident.by_ref {
                    return Err(err(by_ref));
                }
                if let Some(mutability) = &pat_ident.mutability {
                    return Err(err(mutability));
                }
                if let Some(subpat) = &pat_ident.subpat {
                    return Err(err(&subpat.0));
                }
                pat_ident.ident.clone()
            }
            Pat::Wild(ref wild) => {
                return Err(Error::new_spanned(
                    wild,
                    "fields must be named; leave unused bits undeclared",
                ));
            }
            _ => return Err(err(&*pat_type.pat)),
        };

        let path: &Path = if let Type::Path(ref type_path) = *pat_type.ty {
            if type_path.qself.is_some() || type_path.path.segments.len() != 1 {
                return Err(err(&*pat_type.ty));
            }
            &type_path.path
        } else {
            return Err(err(&*pat_type.ty));
        };

        // Leading integer literals, then up to two types: the value type and
        // the access policy, either of which may be omitted.
        let segment = path.segments.first().ok_or_else(|| err(path))?;
        let PathArguments::AngleBracketed(bracketed) = &segment.arguments else {
            return Err(err(&segment.arguments));
        };
        let mut bits = Vec::new();
        let mut types = Vec::new();
        for arg in &bracketed.args {
            match arg {
                GenericArgument::Const(Expr::Lit(ExprLit {
                    lit: Lit::Int(b),
                    ..
                })) if types.is_empty() => {
                    bits.push(b.base10_parse::<usize>()?);
                }
                GenericArgument::Type(ty) => types.push(ty),
                _ => return Err(err(arg)),
            }
        }
        let (value, access) = match types.as_slice() {
            [] => (None, None),
            [ty] => match Policy::from_type(ty) {
                Some(policy) => (None, Some(policy)),
                None => (Some((*ty).clone()), None),
            },
            [value, access] => {
                let policy = Policy::from_type(access).ok_or_else(|| {
                    Error::new_spanned(
                        access,
                        "expected one of `Ro`, `Wo`, `Rw`, `Rew` or `NoAccess`",
                    )
                })?;
                (Some((*value).clone()), Some(policy))
            }
            _ => return Err(err(&bracketed.args)),
        };

        let type_ident = &segment.ident;
        let (kind, high_bit, low_bit) = if type_ident == "Bit" {
            let [bit] = bits[..] else {
                return Err(err(&bracketed.args));
            };
            (Kind::Field, bit, bit)
        } else if type_ident == "Bits" {
            let [high, low] = bits[..] else {
                return Err(err(&bracketed.args));
            };
            if high < low {
                return Err(Error::new_spanned(
                    &path.segments,
                    "first high bit, then low",
                ));
            }
            (Kind::Field, high, low)
        } else if type_ident == "BitSet" {
            let (size, count, offset) = match bits[..] {
                [size, count] => (size, count, 0),
                [size, count, offset] => (size, count, offset),
                _ => return Err(err(&bracketed.args)),
            };
            if size == 0 || count == 0 {
                return Err(Error::new_spanned(
                    &bracketed.args,
                    "field sets must have at least one item of at least one bit",
                ));
            }
            (Kind::Set { size, count }, offset + size * count - 1, offset)
        } else {
            return Err(err(path));
        };

        Ok(Bitfield {
            span: stmt.span(),
            name,
            kind,
            high_bit,
            low_bit,
            value,
            access,
        })
    }
}

struct Bitfields {
    ty: TypeDef,
    fields: Vec<Bitfield>,
    errors: Vec<Error>,
}

impl Bitfields {
    fn constants(&self) -> TokenStream2 {
        let mut field_constants = Vec::new();
        let mut field_metadata = Vec::new();

        for field in &self.fields {
            let name_lower = field.name.to_string();
            let const_name = format_ident!("{}", name_lower.to_uppercase());
            let low_bit = Literal::usize_unsuffixed(field.low_bit);
            let high_bit = Literal::usize_unsuffixed(field.high_bit);
            let item_count = Literal::usize_unsuffixed(field.item_count());
            let access = field.access(&self.ty);

            match field.kind {
                Kind::Field => {
                    let doc = format!("Location of the `{name_lower}` field.");
                    field_constants.push(quote! {
                        #[doc = #doc]
                        pub const #const_name: ::bitview::FieldLocation =
                            ::bitview::FieldLocation::new(#low_bit, #high_bit);
                    });
                }
                Kind::Set { size, count } => {
                    let size = Literal::usize_unsuffixed(size);
                    let count = Literal::usize_unsuffixed(count);
                    let doc =
                        format!("Location of the `{name_lower}` field set.");
                    field_constants.push(quote! {
                        #[doc = #doc]
                        pub const #const_name: ::bitview::FieldSetLocation =
                            ::bitview::FieldSetLocation::new(#size, #count, #low_bit);
                    });
                }
            }

            field_metadata.push(quote! {
                ::bitview::FieldMetadata {
                    name: #name_lower,
                    first_bit: #low_bit,
                    last_bit: #high_bit,
                    item_count: #item_count,
                    access: <#access as ::bitview::AccessPolicy>::ACCESS,
                },
            });
        }

        let num_fields = self.fields.len();
        quote! {
            #(#field_constants)*

            /// Metadata of all fields in the layout, in declaration order.
            pub const FIELDS: [::bitview::FieldMetadata; #num_fields] = [
                #(#field_metadata)*
            ];
        }
    }

    // Range checks that can only be made once the word of the storage type
    // is known.
    fn checks(&self) -> TokenStream2 {
        if self.ty.base.ty.high_bit().is_some() {
            return quote! {};
        }
        let storage = &self.ty.base.storage;
        let checks = self.fields.iter().map(|field| {
            let high_bit = Literal::usize_unsuffixed(field.high_bit);
            let msg = format!(
                "`{}` exceeds the width of the backing word",
                field.name
            );
            quote! {
                assert!(
                    #high_bit < <<#storage as ::bitview::Storage>::Word as ::bitview::Word>::BITS,
                    #msg,
                );
            }
        });
        quote! {
            const _: () = {
                #(#checks)*
            };
        }
    }

    fn fmt_impl(&self) -> TokenStream2 {
        let ty = &self.ty.def.ident;
        let ty_str = ty.to_string();

        let readable = self.fields.iter().filter(|field| {
            self.ty.access.is_readable() && field.access(&self.ty).is_readable()
        });
        let fmt_fields = readable.clone().map(|field| {
            let name = &field.name;
            let name_str = name.to_string();
            quote! { .field(#name_str, &self.#name()) }
        });
        let finish = if readable.count() == self.fields.len() {
            quote! { finish }
        } else {
            quote! { finish_non_exhaustive }
        };

        quote! {
            impl ::core::fmt::Debug for #ty {
                fn fmt(&self, f: &mut ::core::fmt::Formatter<'_>) -> ::core::fmt::Result {
                    f.debug_struct(#ty_str)
                        #(#fmt_fields)*
                        .#finish()
                }
            }
        }
    }

    fn constructors(&self) -> TokenStream2 {
        let storage = &self.ty.base.storage;
        let engine = &self.ty.engine;
        // The bounds are made higher-ranked so that a layout over an engine
        // that is not detached still compiles, just without a callable `new`.
        quote! {
            /// Creates an instance holding `word`.
            #[inline]
            #[must_use]
            pub fn new(word: <#storage as ::bitview::Storage>::Word) -> Self
            where
                for<'a> #engine: ::bitview::Detached,
            {
                Self(::bitview::Register::new(word))
            }

            /// Views the storage at `ptr` as an instance of the layout.
            ///
            /// # Safety
            ///
            /// The requirements of `bitview::Register::from_ptr` apply.
            #[inline]
            #[must_use]
            pub const unsafe fn from_ptr<'a>(ptr: *const #storage) -> &'a Self {
                // SAFETY: `Self` is a transparent wrapper of a register, itself
                // a transparent wrapper of the storage, and the caller
                // guarantees the validity of `ptr`.
                unsafe { &*ptr.cast::<Self>() }
            }
        }
    }
}

impl Parse for Bitfields {
    fn parse(input: ParseStream) -> Result<Self> {
        let input = {
            let content;
            braced!(content in input);
            content
        };

        let ty = input.parse::<TypeDef>()?;

        let input = {
            let content;
            braced!(content in input);
            content
        };

        let mut fields: Vec<Bitfield> = Vec::new();
        let mut errors = Vec::new();
        while !input.is_empty() {
            let field = input.parse::<Bitfield>()?;
            if let Some(prev) = fields.iter().find(|prev| prev.name == field.name)
            {
                errors.push(Error::new(
                    field.span,
                    format!(
                        "`{}` is already declared at {}",
                        field.name,
                        prev.display_range()
                    ),
                ));
            }
            if let Some(access) = field.access
                && !access.within(ty.access)
            {
                errors.push(Error::new(
                    field.span,
                    format!(
                        "the access of `{}` exceeds that of its register",
                        field.name
                    ),
                ));
            }
            if let Some(highest_possible) = ty.base.ty.high_bit()
                && field.high_bit > highest_possible
            {
                errors.push(Error::new(
                    field.span,
                    format!(
                        "high bit {} exceeds the highest possible value \
                         of {highest_possible}",
                        field.high_bit
                    ),
                ));
            }
            fields.push(field);
        }

        // Overlapping fields are permitted: they alias the same bits.
        Ok(Self { ty, fields, errors })
    }
}

impl ToTokens for Bitfields {
    fn to_tokens(&self, tokens: &mut TokenStream2) {
        let type_def = &self.ty.def;
        let type_name = &type_def.ident;
        let vis = &type_def.vis;
        let attrs = &type_def.attrs;
        let storage = &self.ty.base.storage;
        let access = &self.ty.access;
        let engine = &self.ty.engine;

        let strct = quote! {
            #(#attrs)*
            #vis struct #type_name(::bitview::Register<#storage, #access, #engine>);
        };

        if !self.errors.is_empty() {
            let errors = self.errors.iter().map(Error::to_compile_error);
            quote! {
                #strct
                #(#errors)*
            }
            .to_tokens(tokens);
            return;
        }

        let constants = self.constants();
        let constructors = self.constructors();
        let accessors = self.fields.iter().map(|field| field.accessor(&self.ty));
        let checks = self.checks();
        let fmt_impl = self.fmt_impl();
        let clone_impl = if self.ty.access.is_readwrite() {
            quote! {
                impl ::core::clone::Clone for #type_name
                where
                    for<'a> #engine: ::bitview::Detached,
                {
                    fn clone(&self) -> Self {
                        Self(self.0.clone())
                    }
                }
            }
        } else {
            quote! {}
        };

        quote! {
            #strct

            impl #type_name {
                #constants

                #constructors

                #(#accessors)*
            }

            impl ::core::ops::Deref for #type_name {
                type Target = ::bitview::Register<#storage, #access, #engine>;

                fn deref(&self) -> &Self::Target {
                    &self.0
                }
            }

            #clone_impl

            #fmt_impl

            #checks
        }
        .to_tokens(tokens);
    }
}
