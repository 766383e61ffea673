//! Ahead-of-time wrapper generation.

/// Generate a composition wrapper for a trait.
///
/// The generated struct holds the real target and an
/// [`Interceptor`](crate::Interceptor); every listed method forwards to the
/// target through the interception pipeline. Methods returning
/// `Result<T, E>` (with `E: std::error::Error`) report failures to
/// `on_exception`; all others report their return value to `on_result`.
/// Arguments are rendered with `Debug` for the
/// [`InterceptionContext`](crate::InterceptionContext), and only when the
/// call is actually intercepted.
///
/// Restrictions:
///
/// - Return types must be `'static`, since the value is handed to
///   `on_result` as `&dyn Any`. Methods returning borrowed data such as
///   `-> &str` do not compile through the macro.
/// - A return counts as fallible only when spelled `Result<T, E>` or
///   `std::result::Result<T, E>` (`core::` works too). A type alias of a
///   `Result` is forwarded as a plain value and reaches `on_result`.
///
/// ```
/// use std::sync::Arc;
/// use interject_aop::{interface_proxy, Interceptor, InterfaceProxy};
/// use interject_core::TypeKey;
///
/// pub trait Greeter: Send + Sync {
///     fn greet(&self, name: &str) -> String;
/// }
///
/// interface_proxy! {
///     pub struct GreeterProxy for dyn Greeter {
///         fn greet(&self, name: &str) -> String;
///     }
/// }
///
/// struct English;
///
/// impl Greeter for English {
///     fn greet(&self, name: &str) -> String {
///         format!("hello {name}")
///     }
/// }
///
/// let interceptor = Arc::new(Interceptor::passthrough(TypeKey::of::<dyn Greeter>()));
/// let greeter = GreeterProxy::wrap(Arc::new(English), interceptor);
/// assert_eq!(greeter.greet("ada"), "hello ada");
/// ```
#[macro_export]
macro_rules! interface_proxy {
    (
        $(#[$meta:meta])*
        $vis:vis struct $proxy:ident for dyn $iface:path {
            $($body:tt)*
        }
    ) => {
        $(#[$meta])*
        $vis struct $proxy {
            target: ::std::sync::Arc<dyn $iface>,
            interceptor: ::std::sync::Arc<$crate::Interceptor>,
        }

        impl $proxy {
            /// The wrapped target.
            #[allow(dead_code)]
            pub fn target(&self) -> &::std::sync::Arc<dyn $iface> {
                &self.target
            }

            /// The interceptor calls run through.
            #[allow(dead_code)]
            pub fn interceptor(&self) -> &::std::sync::Arc<$crate::Interceptor> {
                &self.interceptor
            }
        }

        impl $crate::InterfaceProxy for $proxy {
            type Interface = dyn $iface;

            const METHODS: &'static [&'static str] = $crate::__proxy_method_names!($($body)*);

            fn wrap(
                target: ::std::sync::Arc<dyn $iface>,
                interceptor: ::std::sync::Arc<$crate::Interceptor>,
            ) -> ::std::sync::Arc<dyn $iface> {
                ::std::sync::Arc::new($proxy {
                    target,
                    interceptor,
                })
            }
        }

        impl $iface for $proxy {
            $crate::__proxy_methods!($($body)*);
        }
    };
}

#[doc(hidden)]
#[macro_export]
macro_rules! __proxy_method_names {
    ($(fn $method:ident ($($params:tt)*) $(-> $ret:ty)?;)*) => {
        &[$(stringify!($method)),*]
    };
}

#[doc(hidden)]
#[macro_export]
macro_rules! __proxy_methods {
    () => {};

    (
        fn $method:ident(&self $(, $arg:ident : $argty:ty)*) -> Result<$ok:ty, $err:ty>;
        $($rest:tt)*
    ) => {
        fn $method(&self $(, $arg: $argty)*) -> ::std::result::Result<$ok, $err> {
            if !self.interceptor.intercepts(stringify!($method)) {
                return self.target.$method($($arg),*);
            }
            let arguments = vec![$($crate::Argument::new(stringify!($arg), &$arg)),*];
            self.interceptor
                .invoke(stringify!($method), arguments, || self.target.$method($($arg),*))
        }

        $crate::__proxy_methods!($($rest)*);
    };

    (
        fn $method:ident(&self $(, $arg:ident : $argty:ty)*)
            -> $(::)? $root:ident::result::Result<$ok:ty, $err:ty>;
        $($rest:tt)*
    ) => {
        $crate::__proxy_methods!(
            fn $method(&self $(, $arg: $argty)*) -> Result<$ok, $err>;
            $($rest)*
        );
    };

    (
        fn $method:ident(&self $(, $arg:ident : $argty:ty)*) -> $ret:ty;
        $($rest:tt)*
    ) => {
        fn $method(&self $(, $arg: $argty)*) -> $ret {
            if !self.interceptor.intercepts(stringify!($method)) {
                return self.target.$method($($arg),*);
            }
            let arguments = vec![$($crate::Argument::new(stringify!($arg), &$arg)),*];
            self.interceptor
                .invoke_infallible(stringify!($method), arguments, || self.target.$method($($arg),*))
        }

        $crate::__proxy_methods!($($rest)*);
    };

    (
        fn $method:ident(&self $(, $arg:ident : $argty:ty)*);
        $($rest:tt)*
    ) => {
        fn $method(&self $(, $arg: $argty)*) {
            if !self.interceptor.intercepts(stringify!($method)) {
                return self.target.$method($($arg),*);
            }
            let arguments = vec![$($crate::Argument::new(stringify!($arg), &$arg)),*];
            self.interceptor
                .invoke_infallible(stringify!($method), arguments, || self.target.$method($($arg),*))
        }

        $crate::__proxy_methods!($($rest)*);
    };
}
