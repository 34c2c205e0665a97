//! Names of runtime collaborators referenced by emitted code.
//!
//! The hand-written runtime library provides the base object, GC tracer, interface mapper, boxing helpers and
//! string pooler. Emitted code calls each one by a fixed name; keeping every spelling here means the backend and
//! the runtime headers can be audited against one list.

/// Runtime helper namespace.
pub const RUNTIME_NS: &str = "::CrossNetRuntime";

// Casting helpers
pub const CAST: &str = "::CrossNetRuntime::Cast";
pub const INTERFACE_CAST: &str = "::CrossNetRuntime::InterfaceCast";
pub const UNSAFE_CAST: &str = "::CrossNetRuntime::UnsafeCast";
pub const REINTERPRET_CAST: &str = "::CrossNetRuntime::ReinterpretCast";
pub const ENUM_CAST: &str = "::CrossNetRuntime::EnumCast";
pub const BOX: &str = "::CrossNetRuntime::Box";
pub const BOX_ENUM: &str = "::CrossNetRuntime::BoxEnum";
pub const UNBOX: &str = "::CrossNetRuntime::Unbox";
pub const IS_CAST: &str = "::CrossNetRuntime::IsCast";
pub const AS_CAST: &str = "::CrossNetRuntime::AsCast";
pub const BASE_TYPE_WRAPPER: &str = "::CrossNetRuntime::BaseTypeWrapper";
/// Instance wrapper for generic parameters and primitives (unscoped spelling, as emitted).
pub const GEN_WRAPPER_CONVERT: &str = "CrossNetRuntime::GenWrapperConvert";
/// Static-access wrapper for generic parameters and primitives (unscoped spelling, as emitted).
pub const GEN_BASE_TYPE_WRAPPER: &str = "CrossNetRuntime::BaseTypeWrapper";

// Pointers and unsafe code
pub const POINTER_WRAPPER: &str = "::CrossNetRuntime::PointerWrapper";
pub const CREATE_POINTER_WRAPPER: &str = "::CrossNetRuntime::CreatePointerWrapper";
pub const POINTER_TO_INT32: &str = "::CrossNetRuntime::PointerToInt32";
pub const SET_FIXED: &str = "::CrossNetRuntime::SetFixed";
pub const MATH_MODULO: &str = "::CrossNetRuntime::__Math__::Modulo";

// Interfaces
pub const INTERFACE_CALL: &str = "INTERFACE__CALL";
pub const INTERFACE_BASE: &str = "::CrossNetRuntime::IInterface";
pub const INTERFACE_INFO: &str = "::CrossNetRuntime::InterfaceInfo";
pub const INTERFACE_MAPPER: &str = "::CrossNetRuntime::InterfaceMapper";
pub const BOXED_OBJECT: &str = "::CrossNetRuntime::BoxedObject";
pub const WRAPPER_NEW_DELETE: &str = "CN__NEW_DELETE_OPERATORS_FOR_WRAPPER";
pub const VALUE_TYPE_NEW_DELETE: &str = "CN__NEW_DELETE_OPERATORS_FOR_VALUE_TYPE";

// GC
pub const GC_TRACE: &str = "::CrossNetRuntime::GCManager::Trace";
pub const TRACER_DO_TRACE: &str = "::CrossNetRuntime::Tracer::DoTrace";

// Strings
pub const STRING_POOLER: &str = "::CrossNetRuntime::StringPooler::GetOrCreateString";
pub const STRING_TYPE: &str = "::System::String";

// Structs and enums
pub const BASE_STRUCT: &str = "::CrossNetRuntime::BaseStruct";
pub const STRUCT_ENUM: &str = "CrossNetCore::__StructEnum__";
pub const STRUCT_EQUALS: &str = "::CrossNetRuntime::StructEquals";
pub const STRUCT_GET_HASH_CODE: &str = "::CrossNetRuntime::StructGetHashCode";
pub const STRUCT_TO_STRING: &str = "::CrossNetRuntime::StructToString";
pub const MEMCLEAR: &str = "__memclear__";

// Object model
pub const OBJECT_TYPE: &str = "::System::Object";
pub const ARRAY_TYPE: &str = "::System::Array__G";
pub const VOID_MARKER: &str = "::System::__Void__";
pub const LOCK: &str = "::System::Object::__Lock__";
pub const UNLOCK: &str = "::System::Object::__Unlock__";

// Macros
pub const TYPEOF_MACRO: &str = "CN_TYPEOF";
pub const DEFAULT_MACRO: &str = "__DEFAULT__";
pub const PARAMETERLESS_NEW_MACRO: &str = "__PARAMETERLESS_NEW__";
pub const STACKALLOC_MACRO: &str = "__stackalloc__";
pub const DYNAMIC_ID_MACRO: &str = "CN_DYNAMIC_ID()";
pub const MULTIPLE_DYNAMIC_OBJECT_ID_MACRO: &str = "CN_MULTIPLE_DYNAMIC_OBJECT_ID0()";
pub const MULTIPLE_DYNAMIC_INTERFACE_ID_MACRO: &str = "CN_MULTIPLE_DYNAMIC_INTERFACE_ID0()";
pub const DYNAMIC_OBJECT_ID_MACRO: &str = "CN_DYNAMIC_OBJECT_ID0";
pub const CREATE_DELEGATE_MACRO: &str = "CREATE_DELEGATE";

// Fixed member names
pub const CTOR: &str = "__ctor__";
pub const STATIC_CTOR: &str = "Static__ctor__";
pub const CREATE: &str = "__Create__";
pub const TRACE: &str = "__Trace__";
pub const CREATE_INTERFACE_MAP: &str = "__CreateInterfaceMap__";
pub const PASSED_INSTANCE: &str = "__passed_instance__";
pub const INSTANCE: &str = "__instance__";
pub const CLOSURE_THIS: &str = "__this__";
pub const INTERFACE_MAP_FIELD: &str = "m__InterfaceMap__";
pub const INTERFACE_MAP_STATIC: &str = "s__InterfaceMap__";
pub const GET_INTERFACE_MAP: &str = "__GetInterfaceMap__";
pub const GET_ID: &str = "__GetId__";
pub const REGISTER_ID: &str = "__RegisterId__";
pub const WRAPPER_PREFIX: &str = "Wrapper__";
